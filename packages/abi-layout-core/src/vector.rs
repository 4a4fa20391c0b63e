//! Fixed-length arrays of storable elements with zero-copy views.

use std::ffi::CString;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{BoundsError, LayoutError};
use crate::record::{AlignedBuffer, FieldKind};
use crate::storable::{check_bounds, Storable};
use crate::types::ValueType;

struct IndexCheck<const I: usize, const N: usize>;

impl<const I: usize, const N: usize> IndexCheck<I, N> {
    const IN_BOUNDS: () = assert!(I < N, "vector index out of bounds");
    const WITHIN: () = assert!(I <= N, "vector view longer than the vector");
}

/// `N` contiguous elements of `T`, stored as `N * T::SIZE` bytes aligned
/// to `T::ALIGN`.
///
/// A vector owns its buffer. [`VectorSlice`] views borrow it without
/// copying.
pub struct Vector<const N: usize, T: Storable> {
    buffer: AlignedBuffer,
    _marker: PhantomData<T>,
}

impl<const N: usize, T: Storable> Vector<N, T> {
    const BYTES: usize = {
        assert!(
            T::SIZE == 0 || N <= (isize::MAX as usize - T::ALIGN) / T::SIZE,
            "vector byte size overflows"
        );
        N * T::SIZE
    };

    /// Allocates a zero-filled vector.
    pub fn zeroed() -> Self {
        let buffer = match AlignedBuffer::zeroed(Self::BYTES, T::ALIGN) {
            Ok(buffer) => buffer,
            Err(_) => unreachable!("vector layout is validated at compile time"),
        };
        Self {
            buffer,
            _marker: PhantomData,
        }
    }

    /// Builds a vector from exactly `N` elements.
    ///
    /// An empty vector (`N == 0`) accepts any input.
    pub fn from_list(xs: &[T]) -> Result<Self, LayoutError> {
        let mut vector = Self::zeroed();
        if N == 0 {
            return Ok(vector);
        }
        if xs.len() != N {
            return Err(LayoutError::LengthMismatch {
                expected: N,
                got: xs.len(),
            });
        }
        for (i, x) in xs.iter().enumerate() {
            x.encode(vector.slot_mut(i));
        }
        Ok(vector)
    }

    /// Takes the first `N` elements of `xs` followed by `default` repeated.
    ///
    /// Longer inputs are truncated, shorter ones padded.
    pub fn from_filled_list(default: T, xs: impl IntoIterator<Item = T>) -> Self {
        Self::filled(N, default, xs)
    }

    /// Like [`from_filled_list`](Self::from_filled_list) but keeps the last
    /// slot for a `default` terminator, as in NUL-terminated buffers.
    pub fn from_filled_list_z(default: T, xs: impl IntoIterator<Item = T>) -> Self {
        Self::filled(N.saturating_sub(1), default, xs)
    }

    fn filled(take: usize, default: T, xs: impl IntoIterator<Item = T>) -> Self {
        let mut vector = Self::zeroed();
        let mut written = 0;
        for x in xs.into_iter().take(take) {
            x.encode(vector.slot_mut(written));
            written += 1;
        }
        for i in written..N {
            default.encode(vector.slot_mut(i));
        }
        vector
    }

    /// Concatenates views left to right into a new vector.
    ///
    /// The total element count must be exactly `N`.
    pub fn concat(parts: &[VectorSlice<'_, T>]) -> Result<Self, LayoutError> {
        let total: usize = parts.iter().map(VectorSlice::len).sum();
        if total != N {
            return Err(LayoutError::LengthMismatch {
                expected: N,
                got: total,
            });
        }
        let mut vector = Self::zeroed();
        let mut cursor = 0;
        for part in parts {
            let bytes = part.as_bytes();
            vector.buffer.as_mut_slice()[cursor..cursor + bytes.len()].copy_from_slice(bytes);
            cursor += bytes.len();
        }
        Ok(vector)
    }

    /// Decodes all elements in order.
    pub fn to_list(&self) -> Vec<T> {
        self.view().to_list()
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Reads element `I`; `I < N` is checked at compile time.
    pub fn index<const I: usize>(&self) -> T {
        #[allow(clippy::let_unit_value)]
        let () = IndexCheck::<I, N>::IN_BOUNDS;
        T::decode(self.slot(I))
    }

    /// Reads element `i`.
    pub fn get(&self, i: usize) -> Result<T, BoundsError> {
        self.view().get(i)
    }

    /// Overwrites element `i`.
    pub fn set(&mut self, i: usize, value: T) -> Result<(), BoundsError> {
        let offset = match i.checked_mul(T::SIZE) {
            Some(offset) if i < N => offset,
            _ => {
                return Err(BoundsError {
                    offset: i.saturating_mul(T::SIZE),
                    size: T::SIZE,
                    len: Self::BYTES,
                })
            }
        };
        value.write(self.buffer.as_mut_slice(), offset)
    }

    /// View of the whole vector.
    pub fn view(&self) -> VectorSlice<'_, T> {
        VectorSlice::new(self.buffer.as_slice(), N)
    }

    /// View of the first `M` elements; `M <= N` is checked at compile time.
    pub fn take<const M: usize>(&self) -> VectorSlice<'_, T> {
        #[allow(clippy::let_unit_value)]
        let () = IndexCheck::<M, N>::WITHIN;
        VectorSlice::new(&self.buffer.as_slice()[..M * T::SIZE], M)
    }

    /// View without the first `M` elements; `M <= N` is checked at compile time.
    pub fn drop<const M: usize>(&self) -> VectorSlice<'_, T> {
        #[allow(clippy::let_unit_value)]
        let () = IndexCheck::<M, N>::WITHIN;
        VectorSlice::new(&self.buffer.as_slice()[M * T::SIZE..], N - M)
    }

    /// View of the first `n` elements.
    pub fn take_n(&self, n: usize) -> Result<VectorSlice<'_, T>, BoundsError> {
        self.view().take_n(n)
    }

    /// View without the first `n` elements.
    pub fn drop_n(&self, n: usize) -> Result<VectorSlice<'_, T>, BoundsError> {
        self.view().drop_n(n)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Pointer to the aligned elements, for passing to system calls.
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buffer.as_mut_ptr()
    }

    /// Field kind for embedding this vector in a record schema.
    pub fn field_kind() -> FieldKind
    where
        T: ValueType + 'static,
    {
        FieldKind::array(FieldKind::of::<T>(), N)
    }

    fn slot(&self, i: usize) -> &[u8] {
        &self.buffer.as_slice()[i * T::SIZE..(i + 1) * T::SIZE]
    }

    fn slot_mut(&mut self, i: usize) -> &mut [u8] {
        &mut self.buffer.as_mut_slice()[i * T::SIZE..(i + 1) * T::SIZE]
    }
}

impl<const N: usize> Vector<N, u8> {
    /// Copies a string into a NUL-terminated buffer, truncating to `N - 1` bytes.
    pub fn from_c_str(s: impl AsRef<[u8]>) -> Self {
        let bytes = s.as_ref();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Self::from_filled_list_z(0, bytes[..end].iter().copied())
    }

    /// Bytes up to the first NUL, or the whole buffer when unterminated.
    pub fn c_str_bytes(&self) -> &[u8] {
        let bytes = self.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        &bytes[..end]
    }

    pub fn to_c_string(&self) -> CString {
        match CString::new(self.c_str_bytes()) {
            Ok(s) => s,
            Err(_) => unreachable!("bytes end before the first NUL"),
        }
    }
}

impl<const N: usize, T: Storable> Default for Vector<N, T> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize, T: Storable> Clone for Vector<N, T> {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            _marker: PhantomData,
        }
    }
}

impl<const N: usize, T: Storable> PartialEq for Vector<N, T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize, T: Storable> Eq for Vector<N, T> {}

impl<const N: usize, T: Storable + fmt::Debug> fmt::Debug for Vector<N, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.view().iter()).finish()
    }
}

impl<const N: usize, T: Storable> Storable for Vector<N, T> {
    const SIZE: usize = Self::BYTES;
    const ALIGN: usize = T::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        let mut vector = Self::zeroed();
        vector
            .buffer
            .as_mut_slice()
            .copy_from_slice(&bytes[..Self::BYTES]);
        vector
    }

    fn encode(&self, out: &mut [u8]) {
        out[..Self::BYTES].copy_from_slice(self.as_bytes());
    }
}

/// Borrowed run of elements inside a [`Vector`].
///
/// The element count is kept alongside the bytes so zero-sized elements
/// still have a length.
pub struct VectorSlice<'a, T: Storable> {
    bytes: &'a [u8],
    len: usize,
    _marker: PhantomData<T>,
}

impl<'a, T: Storable> VectorSlice<'a, T> {
    fn new(bytes: &'a [u8], len: usize) -> Self {
        debug_assert_eq!(bytes.len(), len * T::SIZE);
        Self {
            bytes,
            len,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> Result<T, BoundsError> {
        if i >= self.len {
            return Err(BoundsError {
                offset: i.saturating_mul(T::SIZE),
                size: T::SIZE,
                len: self.bytes.len(),
            });
        }
        T::read(self.bytes, i * T::SIZE)
    }

    pub fn take_n(&self, n: usize) -> Result<VectorSlice<'a, T>, BoundsError> {
        let range = self.prefix(n)?;
        Ok(VectorSlice::new(&self.bytes[range], n))
    }

    pub fn drop_n(&self, n: usize) -> Result<VectorSlice<'a, T>, BoundsError> {
        let range = self.prefix(n)?;
        Ok(VectorSlice::new(&self.bytes[range.end..], self.len - n))
    }

    fn prefix(&self, n: usize) -> Result<std::ops::Range<usize>, BoundsError> {
        if n > self.len {
            return Err(BoundsError {
                offset: 0,
                size: n.saturating_mul(T::SIZE),
                len: self.bytes.len(),
            });
        }
        check_bounds(self.bytes.len(), 0, n * T::SIZE)
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let bytes = self.bytes;
        (0..self.len()).map(move |i| T::decode(&bytes[i * T::SIZE..]))
    }

    pub fn to_list(&self) -> Vec<T> {
        self.iter().collect()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<T: Storable> Clone for VectorSlice<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Storable> Copy for VectorSlice<'_, T> {}

impl<T: Storable + fmt::Debug> fmt::Debug for VectorSlice<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
