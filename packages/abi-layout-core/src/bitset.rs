//! Integer-backed sets of flag values, one bit per flag.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr};

use crate::error::DecodeError;
use crate::storable::Storable;
use crate::word::Word;

/// Values that map to bit positions of a [`BitSet`].
///
/// `to_bit_offset` and `from_bit_offset` must be mutual inverses over the
/// element domain.
pub trait BitFlag: Copy {
    /// Highest bit position used by any element
    const MAX_BIT_OFFSET: u32;

    /// Returns the bit position of this element.
    fn to_bit_offset(self) -> u32;

    /// Returns the element at `offset`, if any.
    fn from_bit_offset(offset: u32) -> Option<Self>;
}

/// Set of `E` values stored in the bits of a `B` word.
///
/// `insert` and `delete` return new sets.
pub struct BitSet<B, E> {
    bits: B,
    _marker: PhantomData<E>,
}

impl<B: Word, E: BitFlag> BitSet<B, E> {
    const FITS: () = assert!(
        E::MAX_BIT_OFFSET < B::BITS,
        "bit set backing word is narrower than the element domain"
    );

    fn from_raw(bits: B) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS;
        Self {
            bits,
            _marker: PhantomData,
        }
    }

    fn with_bits(bits: u128) -> Self {
        Self::from_raw(B::from_bits_truncate(bits))
    }

    /// Returns the empty set.
    pub fn empty() -> Self {
        Self::from_raw(B::default())
    }

    /// Returns the set containing only `elem`.
    pub fn singleton(elem: E) -> Self {
        Self::empty().insert(elem)
    }

    /// Returns a copy of the set with `elem` added.
    #[must_use]
    pub fn insert(self, elem: E) -> Self {
        Self::with_bits(self.bits.to_bits() | (1u128 << elem.to_bit_offset()))
    }

    /// Returns a copy of the set with `elem` removed.
    #[must_use]
    pub fn delete(self, elem: E) -> Self {
        Self::with_bits(self.bits.to_bits() & !(1u128 << elem.to_bit_offset()))
    }

    /// Returns whether `elem` is in the set.
    pub fn member(&self, elem: E) -> bool {
        (self.bits.to_bits() >> elem.to_bit_offset()) & 1 == 1
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self::with_bits(self.bits.to_bits() | other.bits.to_bits())
    }

    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self::with_bits(self.bits.to_bits() & other.bits.to_bits())
    }

    /// Elements of `self` not in `other`.
    #[must_use]
    pub fn difference(self, other: Self) -> Self {
        Self::with_bits(self.bits.to_bits() & !other.bits.to_bits())
    }

    pub fn is_empty(&self) -> bool {
        self.bits.to_bits() == 0
    }

    /// Number of set bits.
    pub fn len(&self) -> usize {
        self.bits.to_bits().count_ones() as usize
    }

    /// Returns the backing word.
    pub fn bits(&self) -> B {
        self.bits
    }

    /// Builds a set from a backing word, rejecting bits with no element.
    pub fn from_bits(bits: B) -> Result<Self, DecodeError> {
        let raw = bits.to_bits();
        if Self::mapped_bits(raw) != raw {
            return Err(DecodeError {
                type_name: std::any::type_name::<E>(),
                raw,
            });
        }
        Ok(Self::from_raw(bits))
    }

    /// Builds a set from a backing word, dropping bits with no element.
    pub fn from_bits_truncate(bits: B) -> Self {
        Self::with_bits(Self::mapped_bits(bits.to_bits()))
    }

    /// Builds a set from a backing word, keeping every bit.
    ///
    /// Bits with no element are preserved in `bits()` but skipped by `elems()`.
    pub fn from_bits_retain(bits: B) -> Self {
        Self::from_raw(bits)
    }

    fn mapped_bits(raw: u128) -> u128 {
        let mut remaining = raw;
        let mut mapped = 0u128;
        while remaining != 0 {
            let offset = remaining.trailing_zeros();
            remaining &= remaining - 1;
            if E::from_bit_offset(offset).is_some() {
                mapped |= 1u128 << offset;
            }
        }
        mapped
    }

    /// Lazily enumerates the elements in ascending bit order.
    pub fn elems(&self) -> Elems<E> {
        Elems {
            remaining: self.bits.to_bits(),
            _marker: PhantomData,
        }
    }

    /// Collects the elements in ascending bit order.
    pub fn to_list(&self) -> Vec<E> {
        self.elems().collect()
    }
}

/// Iterator over the elements of a [`BitSet`], lowest bit first.
pub struct Elems<E> {
    remaining: u128,
    _marker: PhantomData<E>,
}

impl<E> Clone for Elems<E> {
    fn clone(&self) -> Self {
        Self {
            remaining: self.remaining,
            _marker: PhantomData,
        }
    }
}

impl<E: BitFlag> Iterator for Elems<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        while self.remaining != 0 {
            let offset = self.remaining.trailing_zeros();
            // clear lowest set bit
            self.remaining &= self.remaining - 1;
            if let Some(elem) = E::from_bit_offset(offset) {
                return Some(elem);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining.count_ones() as usize))
    }
}

impl<B: Word, E: BitFlag> FromIterator<E> for BitSet<B, E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::insert)
    }
}

impl<B: Word, E: BitFlag> IntoIterator for BitSet<B, E> {
    type Item = E;
    type IntoIter = Elems<E>;

    fn into_iter(self) -> Elems<E> {
        self.elems()
    }
}

impl<B: Word, E: BitFlag> BitOr for BitSet<B, E> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl<B: Word, E: BitFlag> BitAnd for BitSet<B, E> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

impl<B: Word, E: BitFlag> Default for BitSet<B, E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<B: Copy, E> Clone for BitSet<B, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Copy, E> Copy for BitSet<B, E> {}

impl<B: PartialEq, E> PartialEq for BitSet<B, E> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<B: Eq, E> Eq for BitSet<B, E> {}

impl<B: Hash, E> Hash for BitSet<B, E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<B: Word, E: BitFlag + fmt::Debug> fmt::Debug for BitSet<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitSet")
            .field("bits", &format_args!("{:#b}", self.bits.to_bits()))
            .field("elems", &self.to_list())
            .finish()
    }
}

impl<B: Word, E: BitFlag> Storable for BitSet<B, E> {
    const SIZE: usize = B::SIZE;
    const ALIGN: usize = B::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        Self::from_bits_retain(B::decode(bytes))
    }

    fn encode(&self, out: &mut [u8]) {
        self.bits.encode(out);
    }
}
