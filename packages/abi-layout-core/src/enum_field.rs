//! Integer-backed encodings of symbolic enumerated values.
//!
//! [`CEnum`] maps values to integer codes, by default their ordinal position
//! in `VARIANTS`. [`OpenEnum`] covers kernel enums whose last variant stands
//! for "every further value" and carries the residual code as payload.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{DecodeError, LayoutError, RangeError};
use crate::storable::Storable;
use crate::word::Word;

/// Mapping between enum values and their C integer codes.
///
/// Custom mappings must stay bijective over `VARIANTS`; see [`check_bijective`].
pub trait CEnum: Copy + PartialEq + 'static {
    /// Declared values, in declaration order
    const VARIANTS: &'static [Self];

    /// Returns the C code of this value (default: ordinal position).
    fn to_code(self) -> i128 {
        match Self::VARIANTS.iter().position(|v| *v == self) {
            Some(position) => position as i128,
            None => unreachable!("value missing from VARIANTS; override to_code"),
        }
    }

    /// Returns the value for a C code (default: inverse of the ordinal).
    fn from_code(code: i128) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|index| Self::VARIANTS.get(index).copied())
    }
}

/// Verifies that `to_code`/`from_code` are mutual inverses without duplicate codes.
pub fn check_bijective<E: CEnum>() -> Result<(), LayoutError> {
    let mut seen = std::collections::HashSet::new();
    for value in E::VARIANTS {
        let code = value.to_code();
        if !seen.insert(code) || E::from_code(code) != Some(*value) {
            return Err(LayoutError::NonBijectiveEnum {
                type_name: std::any::type_name::<E>(),
                code,
            });
        }
    }
    Ok(())
}

/// A `B` word holding the code of one `E` value.
pub struct EnumField<B, E> {
    raw: B,
    _marker: PhantomData<E>,
}

impl<B: Word, E: CEnum> EnumField<B, E> {
    /// Encodes `value`, failing if its code does not fit the backing word.
    pub fn new(value: E) -> Result<Self, RangeError> {
        let code = value.to_code();
        let raw = B::try_from_i128(code).ok_or_else(|| RangeError {
            type_name: std::any::type_name::<B>(),
            value: code.to_string(),
        })?;
        Ok(Self::from_raw(raw))
    }

    /// Wraps a raw code without checking it.
    pub fn from_raw(raw: B) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub fn raw(&self) -> B {
        self.raw
    }

    /// Decodes the value, failing on codes with no mapping.
    pub fn get(&self) -> Result<E, DecodeError> {
        self.try_get().ok_or_else(|| DecodeError {
            type_name: std::any::type_name::<E>(),
            raw: self.raw.to_bits(),
        })
    }

    /// Decodes the value, returning `None` on codes with no mapping.
    pub fn try_get(&self) -> Option<E> {
        E::from_code(self.raw.to_i128())
    }
}

impl<B: Copy, E> Clone for EnumField<B, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: Copy, E> Copy for EnumField<B, E> {}

impl<B: PartialEq, E> PartialEq for EnumField<B, E> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<B: Eq, E> Eq for EnumField<B, E> {}

impl<B: Word, E: CEnum + fmt::Debug> fmt::Debug for EnumField<B, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumField")
            .field("raw", &self.raw)
            .field("value", &self.try_get())
            .finish()
    }
}

impl<B: Word, E: CEnum> Storable for EnumField<B, E> {
    const SIZE: usize = B::SIZE;
    const ALIGN: usize = B::ALIGN;

    fn decode(bytes: &[u8]) -> Self {
        Self::from_raw(B::decode(bytes))
    }

    fn encode(&self, out: &mut [u8]) {
        self.raw.encode(out);
    }
}

/// Enum whose last variant represents every code past the plain variants.
///
/// Codes below `PLAIN.len()` decode to the plain variant at that position;
/// codes at or above decode to `overflow(code - PLAIN.len())`. The table is
/// fixed by existing kernel structures and must not be reordered.
pub trait OpenEnum: Copy + PartialEq + 'static {
    /// Plain variants, in code order
    const PLAIN: &'static [Self];

    /// Builds the overflow variant carrying `residual`.
    fn overflow(residual: u64) -> Self;

    /// Returns the residual of the overflow variant, `None` for plain variants.
    fn residual(&self) -> Option<u64>;
}

/// Decodes an index, falling back to the overflow variant.
pub fn decode_open<E: OpenEnum>(index: u64) -> E {
    match decode_open_maybe(index) {
        Some(value) => value,
        None => E::overflow(index - E::PLAIN.len() as u64),
    }
}

/// Decodes an index, returning `None` past the plain variants.
pub fn decode_open_maybe<E: OpenEnum>(index: u64) -> Option<E> {
    usize::try_from(index)
        .ok()
        .and_then(|i| E::PLAIN.get(i).copied())
}

/// Encodes a value back to its index.
pub fn encode_open<E: OpenEnum>(value: E) -> u128 {
    match value.residual() {
        Some(residual) => E::PLAIN.len() as u128 + u128::from(residual),
        None => match E::PLAIN.iter().position(|v| *v == value) {
            Some(position) => position as u128,
            None => unreachable!("plain value missing from PLAIN"),
        },
    }
}
