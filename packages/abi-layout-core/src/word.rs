//! Integer backing words for bit sets, enum codes and fixed-point numbers.

use std::fmt::Debug;

use crate::storable::Storable;

/// Fixed-width integer used as raw storage for a typed encoding.
///
/// Bit patterns are exchanged as zero-extended `u128`, numeric values as
/// `i128`; every supported width fits both.
pub trait Word: Storable + Copy + Eq + Debug + Default {
    /// Width in bits
    const BITS: u32;
    /// Whether the numeric interpretation is two's complement
    const SIGNED: bool;

    /// Returns the raw bit pattern, zero-extended.
    fn to_bits(self) -> u128;

    /// Builds a word from the low `BITS` bits of `bits`.
    fn from_bits_truncate(bits: u128) -> Self;

    /// Returns the numeric value.
    fn to_i128(self) -> i128;

    /// Builds a word from a numeric value if it is in range.
    fn try_from_i128(value: i128) -> Option<Self>;

    /// Smallest representable numeric value.
    fn min_i128() -> i128;

    /// Largest representable numeric value.
    fn max_i128() -> i128;
}

macro_rules! impl_word {
    ($($t:ty => $unsigned:ty, $signed:expr);* $(;)?) => {
        $(
            impl Word for $t {
                const BITS: u32 = <$t>::BITS;
                const SIGNED: bool = $signed;

                fn to_bits(self) -> u128 {
                    self as $unsigned as u128
                }

                fn from_bits_truncate(bits: u128) -> Self {
                    bits as $unsigned as $t
                }

                fn to_i128(self) -> i128 {
                    self as i128
                }

                fn try_from_i128(value: i128) -> Option<Self> {
                    <$t>::try_from(value).ok()
                }

                fn min_i128() -> i128 {
                    <$t>::MIN as i128
                }

                fn max_i128() -> i128 {
                    <$t>::MAX as i128
                }
            }
        )*
    };
}

impl_word! {
    u8 => u8, false;
    u16 => u16, false;
    u32 => u32, false;
    u64 => u64, false;
    usize => usize, false;
    i8 => u8, true;
    i16 => u16, true;
    i32 => u32, true;
    i64 => u64, true;
    isize => usize, true;
}
