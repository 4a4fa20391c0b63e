//! Fixed-size, fixed-alignment values stored in byte buffers.
//!
//! Every `Storable` type has a size and an alignment matching the platform
//! C ABI and can be read from or written to a byte buffer at an offset.
//! Multi-byte values are stored in host byte order; see [`endian`] for
//! explicit byte-order wrappers.

pub mod endian;

use std::ops::Range;

use crate::error::BoundsError;

pub use endian::{
    big_to_host, host_endianness, host_to_big, host_to_little, little_to_host, BigEndian,
    ByteSwap, Endianness, LittleEndian,
};

/// Size/alignment/read/write contract for values with a fixed binary layout.
pub trait Storable: Sized {
    /// Size in bytes
    const SIZE: usize;
    /// Alignment requirement in bytes
    const ALIGN: usize;

    /// Returns the size in bytes.
    fn size_of() -> usize {
        Self::SIZE
    }

    /// Returns the alignment requirement in bytes.
    fn alignment() -> usize {
        Self::ALIGN
    }

    /// Decodes a value from the first `SIZE` bytes of `bytes`.
    ///
    /// Callers guarantee `bytes.len() >= SIZE`.
    fn decode(bytes: &[u8]) -> Self;

    /// Encodes the value into the first `SIZE` bytes of `out`.
    ///
    /// Callers guarantee `out.len() >= SIZE`.
    fn encode(&self, out: &mut [u8]);

    /// Reads a value at `offset`, failing if it does not fit in `buf`.
    fn read(buf: &[u8], offset: usize) -> Result<Self, BoundsError> {
        let range = check_bounds(buf.len(), offset, Self::SIZE)?;
        Ok(Self::decode(&buf[range]))
    }

    /// Writes the value at `offset`, failing if it does not fit in `buf`.
    fn write(&self, buf: &mut [u8], offset: usize) -> Result<(), BoundsError> {
        let range = check_bounds(buf.len(), offset, Self::SIZE)?;
        self.encode(&mut buf[range]);
        Ok(())
    }
}

/// Returns the byte range `offset..offset + size` if it lies within `len`.
pub fn check_bounds(len: usize, offset: usize, size: usize) -> Result<Range<usize>, BoundsError> {
    match offset.checked_add(size) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(BoundsError { offset, size, len }),
    }
}

macro_rules! impl_storable_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl Storable for $t {
                const SIZE: usize = std::mem::size_of::<$t>();
                const ALIGN: usize = std::mem::align_of::<$t>();

                fn decode(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    <$t>::from_ne_bytes(raw)
                }

                fn encode(&self, out: &mut [u8]) {
                    out[..Self::SIZE].copy_from_slice(&self.to_ne_bytes());
                }
            }
        )*
    };
}

impl_storable_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, usize, isize, f32, f64);

impl Storable for bool {
    const SIZE: usize = 1;
    const ALIGN: usize = 1;

    fn decode(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }

    fn encode(&self, out: &mut [u8]) {
        out[0] = u8::from(*self);
    }
}

impl Storable for () {
    const SIZE: usize = 0;
    const ALIGN: usize = 1;

    fn decode(_bytes: &[u8]) -> Self {}

    fn encode(&self, _out: &mut [u8]) {}
}

impl<T> Storable for *const T {
    const SIZE: usize = std::mem::size_of::<usize>();
    const ALIGN: usize = std::mem::align_of::<usize>();

    fn decode(bytes: &[u8]) -> Self {
        usize::decode(bytes) as *const T
    }

    fn encode(&self, out: &mut [u8]) {
        (*self as usize).encode(out);
    }
}

impl<T> Storable for *mut T {
    const SIZE: usize = std::mem::size_of::<usize>();
    const ALIGN: usize = std::mem::align_of::<usize>();

    fn decode(bytes: &[u8]) -> Self {
        usize::decode(bytes) as *mut T
    }

    fn encode(&self, out: &mut [u8]) {
        (*self as usize).encode(out);
    }
}

impl<T: Storable, const N: usize> Storable for [T; N] {
    const SIZE: usize = T::SIZE * N;
    const ALIGN: usize = T::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        std::array::from_fn(|i| T::decode(&bytes[i * T::SIZE..(i + 1) * T::SIZE]))
    }

    fn encode(&self, out: &mut [u8]) {
        for (i, item) in self.iter().enumerate() {
            item.encode(&mut out[i * T::SIZE..(i + 1) * T::SIZE]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_sizes_match_native() {
        assert_eq!(u8::size_of(), 1);
        assert_eq!(u16::size_of(), 2);
        assert_eq!(u32::alignment(), std::mem::align_of::<u32>());
        assert_eq!(u64::alignment(), std::mem::align_of::<u64>());
        assert_eq!(<*const u8>::size_of(), std::mem::size_of::<*const u8>());
        assert_eq!(<[u16; 5]>::size_of(), 10);
        assert_eq!(<[u16; 5]>::alignment(), 2);
    }

    #[test]
    fn test_read_write_at_offset() {
        let mut buf = [0u8; 12];
        0xDEAD_BEEFu32.write(&mut buf, 4).unwrap();
        assert_eq!(&buf[4..8], &0xDEAD_BEEFu32.to_ne_bytes());
        assert_eq!(u32::read(&buf, 4).unwrap(), 0xDEAD_BEEF);
        assert_eq!(u8::read(&buf, 0).unwrap(), 0);
    }

    #[test]
    fn test_out_of_bounds_is_rejected() {
        let mut buf = [0u8; 6];
        let err = u32::read(&buf, 3).unwrap_err();
        assert_eq!(
            err,
            BoundsError {
                offset: 3,
                size: 4,
                len: 6
            }
        );
        assert!(1u64.write(&mut buf, 0).is_err());
        assert!(u8::read(&buf, usize::MAX).is_err());
        // The buffer is untouched by a failed write
        assert_eq!(buf, [0u8; 6]);
    }

    #[test]
    fn test_bool_and_pointer() {
        let mut buf = [0u8; 16];
        true.write(&mut buf, 0).unwrap();
        assert!(bool::read(&buf, 0).unwrap());
        buf[1] = 7;
        assert!(bool::read(&buf, 1).unwrap());

        let ptr = 0x1000usize as *const u32;
        ptr.write(&mut buf, 8).unwrap();
        assert_eq!(<*const u32 as Storable>::read(&buf, 8).unwrap(), ptr);
    }

    #[test]
    fn test_array_elements_are_contiguous() {
        let mut buf = [0u8; 6];
        [1u16, 2, 3].write(&mut buf, 0).unwrap();
        assert_eq!(u16::read(&buf, 2).unwrap(), 2);
        assert_eq!(<[u16; 3]>::read(&buf, 0).unwrap(), [1, 2, 3]);
    }
}
