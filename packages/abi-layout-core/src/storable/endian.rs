//! Host byte-order detection and explicit byte-order wrappers.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::Storable;

/// Byte order of multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    Little,
    Big,
}

static HOST_ENDIANNESS: OnceLock<Endianness> = OnceLock::new();

/// Returns the byte order of the running process.
///
/// Detected once on first use and cached for the process lifetime.
pub fn host_endianness() -> Endianness {
    *HOST_ENDIANNESS.get_or_init(detect_host_endianness)
}

fn detect_host_endianness() -> Endianness {
    let probe = 0x0102_0304u32;
    let mut memory = [0u8; 4];
    probe.encode(&mut memory);
    match memory {
        [0x01, 0x02, 0x03, 0x04] => Endianness::Big,
        [0x04, 0x03, 0x02, 0x01] => Endianness::Little,
        other => panic!("unsupported mixed byte order: {other:02x?}"),
    }
}

/// Values whose byte representation can be reversed.
pub trait ByteSwap: Copy {
    fn swap_bytes(self) -> Self;
}

macro_rules! impl_byte_swap {
    ($($t:ty),* $(,)?) => {
        $(
            impl ByteSwap for $t {
                fn swap_bytes(self) -> Self {
                    <$t>::swap_bytes(self)
                }
            }
        )*
    };
}

impl_byte_swap!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, usize, isize);

impl ByteSwap for f32 {
    fn swap_bytes(self) -> Self {
        f32::from_bits(self.to_bits().swap_bytes())
    }
}

impl ByteSwap for f64 {
    fn swap_bytes(self) -> Self {
        f64::from_bits(self.to_bits().swap_bytes())
    }
}

fn convert<T: ByteSwap>(value: T, order: Endianness) -> T {
    if host_endianness() == order {
        value
    } else {
        value.swap_bytes()
    }
}

/// Converts a host-order value to big-endian representation.
pub fn host_to_big<T: ByteSwap>(value: T) -> T {
    convert(value, Endianness::Big)
}

/// Converts a big-endian representation to host order.
pub fn big_to_host<T: ByteSwap>(value: T) -> T {
    convert(value, Endianness::Big)
}

/// Converts a host-order value to little-endian representation.
pub fn host_to_little<T: ByteSwap>(value: T) -> T {
    convert(value, Endianness::Little)
}

/// Converts a little-endian representation to host order.
pub fn little_to_host<T: ByteSwap>(value: T) -> T {
    convert(value, Endianness::Little)
}

/// A value stored big-endian in memory.
///
/// The wrapped value is always in host order; byte reversal only happens
/// on read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BigEndian<T>(pub T);

/// A value stored little-endian in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LittleEndian<T>(pub T);

impl<T: Storable + ByteSwap> Storable for BigEndian<T> {
    const SIZE: usize = T::SIZE;
    const ALIGN: usize = T::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        BigEndian(big_to_host(T::decode(bytes)))
    }

    fn encode(&self, out: &mut [u8]) {
        host_to_big(self.0).encode(out);
    }
}

impl<T: Storable + ByteSwap> Storable for LittleEndian<T> {
    const SIZE: usize = T::SIZE;
    const ALIGN: usize = T::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        LittleEndian(little_to_host(T::decode(bytes)))
    }

    fn encode(&self, out: &mut [u8]) {
        host_to_little(self.0).encode(out);
    }
}
