//! Sets of real numbers over a discrete unum lattice.
//!
//! A unum of `BITS` bits indexes `2^BITS` points of the projective real
//! line: exact values alternating with the open intervals between them,
//! arranged in a ring. A SORN is a bit mask with one bit per ring position.

use std::fmt;
use std::marker::PhantomData;

use crate::error::DecodeError;
use crate::storable::Storable;
use crate::word::Word;

/// Value of a discrete unum encoding.
///
/// `index` and `from_index` are mutual inverses over `0..COUNT`, where
/// indices follow ring order.
pub trait Unum: Copy + Eq {
    /// Encoding width in bits
    const BITS: u32;
    /// Number of lattice points
    const COUNT: usize = 1 << Self::BITS;

    fn index(self) -> usize;

    fn from_index(index: usize) -> Option<Self>;
}

/// Set of unum values stored in the low `U::COUNT` bits of `B`.
pub struct Sorn<B, U> {
    bits: B,
    _marker: PhantomData<U>,
}

impl<B: Word, U: Unum> Sorn<B, U> {
    const FITS: () = assert!(
        U::COUNT <= B::BITS as usize,
        "SORN backing word is narrower than the unum lattice"
    );

    fn from_raw(bits: u128) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS;
        Self {
            bits: B::from_bits_truncate(bits),
            _marker: PhantomData,
        }
    }

    fn mask() -> u128 {
        if U::COUNT >= 128 {
            u128::MAX
        } else {
            (1u128 << U::COUNT) - 1
        }
    }

    pub fn empty() -> Self {
        Self::from_raw(0)
    }

    /// Every lattice point.
    pub fn full() -> Self {
        Self::from_raw(Self::mask())
    }

    pub fn singleton(u: U) -> Self {
        Self::from_raw(1u128 << u.index())
    }

    #[must_use]
    pub fn insert(self, u: U) -> Self {
        Self::from_raw(self.bits.to_bits() | 1u128 << u.index())
    }

    pub fn member(&self, u: U) -> bool {
        self.bits.to_bits() & (1u128 << u.index()) != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self::from_raw(self.bits.to_bits() | other.bits.to_bits())
    }

    pub fn intersection(self, other: Self) -> Self {
        Self::from_raw(self.bits.to_bits() & other.bits.to_bits())
    }

    /// Lattice points not in the set.
    pub fn complement(self) -> Self {
        Self::from_raw(!self.bits.to_bits() & Self::mask())
    }

    /// Points from `lo` to `hi` inclusive, walking the ring upward.
    ///
    /// Wraps through infinity when `hi` precedes `lo`.
    pub fn range(lo: U, hi: U) -> Self {
        let (lo, hi) = (lo.index(), hi.index());
        let bits = if lo <= hi {
            Self::mask() >> (U::COUNT - 1 - hi) & !((1u128 << lo) - 1)
        } else {
            !(Self::mask() >> (U::COUNT - 1 - hi) ^ Self::mask() >> (U::COUNT - lo))
                & Self::mask()
        };
        Self::from_raw(bits)
    }

    pub fn is_empty(&self) -> bool {
        self.bits.to_bits() == 0
    }

    pub fn len(&self) -> usize {
        self.bits.to_bits().count_ones() as usize
    }

    /// Members in ring order.
    pub fn members(&self) -> Vec<U> {
        let mut remaining = self.bits.to_bits();
        let mut out = Vec::with_capacity(self.len());
        while remaining != 0 {
            let index = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            if let Some(u) = U::from_index(index) {
                out.push(u);
            }
        }
        out
    }

    pub fn bits(&self) -> B {
        self.bits
    }

    /// Builds a set from raw bits, rejecting bits beyond the lattice.
    pub fn from_bits(bits: B) -> Result<Self, DecodeError> {
        if bits.to_bits() & !Self::mask() != 0 {
            return Err(DecodeError {
                type_name: "sorn",
                raw: bits.to_bits(),
            });
        }
        Ok(Self::from_raw(bits.to_bits()))
    }
}

impl<B: Word, U: Unum> FromIterator<U> for Sorn<B, U> {
    fn from_iter<I: IntoIterator<Item = U>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::insert)
    }
}

impl<B: Word, U: Unum> Default for Sorn<B, U> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<B: Copy, U> Clone for Sorn<B, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Copy, U> Copy for Sorn<B, U> {}

impl<B: PartialEq, U> PartialEq for Sorn<B, U> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<B: Eq, U> Eq for Sorn<B, U> {}

impl<B: Word, U: Unum + fmt::Debug> fmt::Debug for Sorn<B, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.members()).finish()
    }
}

impl<B: Word, U: Unum> Storable for Sorn<B, U> {
    const SIZE: usize = B::SIZE;
    const ALIGN: usize = B::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        Self::from_raw(B::decode(bytes).to_bits() & Self::mask())
    }

    fn encode(&self, out: &mut [u8]) {
        self.bits.encode(out);
    }
}

/// Three-bit unum: exact `0`, `1`, `±∞`, `-1` and the open intervals
/// between them, in ring order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unum3 {
    Zero,
    /// (0, 1)
    ZeroToOne,
    One,
    /// (1, ∞)
    OneToInf,
    Inf,
    /// (-∞, -1)
    InfToNegOne,
    NegOne,
    /// (-1, 0)
    NegOneToZero,
}

impl Unum3 {
    const RING: [Unum3; 8] = [
        Unum3::Zero,
        Unum3::ZeroToOne,
        Unum3::One,
        Unum3::OneToInf,
        Unum3::Inf,
        Unum3::InfToNegOne,
        Unum3::NegOne,
        Unum3::NegOneToZero,
    ];

    /// Whether this is an exact point rather than an interval.
    pub fn is_exact(self) -> bool {
        self.index() % 2 == 0
    }

    /// `-x`: reflection of the ring through zero and infinity.
    pub fn negate(self) -> Self {
        Self::RING[(8 - self.index()) % 8]
    }

    /// `1/x`: reflection of the ring through one and minus one.
    pub fn reciprocal(self) -> Self {
        Self::RING[(12 - self.index()) % 8]
    }
}

impl Unum for Unum3 {
    const BITS: u32 = 3;

    fn index(self) -> usize {
        self as usize
    }

    fn from_index(index: usize) -> Option<Self> {
        Self::RING.get(index).copied()
    }
}
