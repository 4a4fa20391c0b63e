//! Binary fixed-point numbers packed into an integer word.

use crate::error::RangeError;
use crate::storable::Storable;
use crate::word::Word;

/// A real number stored as `round(x * 2^F)` in the word `B`.
///
/// The high `I` bits hold the (two's complement, when `B` is signed)
/// integer part and the low `F` bits the fraction. `I + F` must equal the
/// width of `B`; this is checked at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint<B: Word, const I: u32, const F: u32> {
    raw: B,
}

impl<B: Word, const I: u32, const F: u32> Default for FixedPoint<B, I, F> {
    fn default() -> Self {
        Self::from_raw(B::default())
    }
}

impl<B: Word, const I: u32, const F: u32> FixedPoint<B, I, F> {
    const SPLIT: () = assert!(
        I + F == B::BITS,
        "integer and fraction widths must add up to the backing word"
    );

    /// Smallest representable step, `1 / 2^F`.
    pub const EPSILON: f64 = 1.0 / (1u128 << F) as f64;

    fn scale() -> f64 {
        (1u128 << F) as f64
    }

    /// Wraps a raw bit pattern.
    pub fn from_raw(raw: B) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SPLIT;
        Self { raw }
    }

    pub fn raw(&self) -> B {
        self.raw
    }

    /// Encodes `x`, rounding to the nearest step.
    ///
    /// # Returns
    /// `Err(RangeError)` when `x` is not finite or the rounded value does
    /// not fit the integer part.
    pub fn to_fixed_point(x: f64) -> Result<Self, RangeError> {
        let out_of_range = || RangeError {
            type_name: "fixed point",
            value: x.to_string(),
        };
        if !x.is_finite() {
            return Err(out_of_range());
        }
        let scaled = (x * Self::scale()).round();
        // `as` saturates, so anything beyond i128 still fails the word check
        B::try_from_i128(scaled as i128)
            .map(Self::from_raw)
            .ok_or_else(out_of_range)
    }

    /// Encodes `x`, clamping to the representable range. NaN maps to zero.
    pub fn to_fixed_point_saturating(x: f64) -> Self {
        if x.is_nan() {
            return Self::from_raw(B::default());
        }
        let scaled = (x * Self::scale()).round();
        let clamped = if scaled <= B::min_i128() as f64 {
            B::min_i128()
        } else if scaled >= B::max_i128() as f64 {
            B::max_i128()
        } else {
            scaled as i128
        };
        Self::from_raw(B::try_from_i128(clamped).unwrap_or_default())
    }

    /// Decodes to `raw / 2^F`.
    #[allow(clippy::wrong_self_convention)]
    pub fn from_fixed_point(&self) -> f64 {
        self.raw.to_i128() as f64 / Self::scale()
    }

    /// Integer part, rounded toward negative infinity.
    pub fn integer_part(&self) -> i128 {
        self.raw.to_i128() >> F
    }

    /// The low `F` bits.
    pub fn fraction_bits(&self) -> u128 {
        self.raw.to_bits() & ((1u128 << F) - 1)
    }
}

impl<B: Word, const I: u32, const F: u32> Storable for FixedPoint<B, I, F> {
    const SIZE: usize = B::SIZE;
    const ALIGN: usize = B::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        Self::from_raw(B::decode(bytes))
    }

    fn encode(&self, out: &mut [u8]) {
        self.raw.encode(out);
    }
}
