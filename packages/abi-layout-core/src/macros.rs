//! Declarative helpers for C enum and flag types.

/// Declares a fieldless enum with ordinal C codes and bit positions.
///
/// The n-th variant has code `n` and bit offset `n`.
///
/// ```
/// use abi_layout_core::{c_enum, bitset::BitSet};
///
/// c_enum! {
///     pub enum Perm { Read, Write, Exec }
/// }
///
/// let set: BitSet<u8, Perm> = [Perm::Read, Perm::Exec].into_iter().collect();
/// assert_eq!(set.bits(), 0b101);
/// ```
#[macro_export]
macro_rules! c_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::enum_field::CEnum for $name {
            const VARIANTS: &'static [Self] = &[$(Self::$variant),+];
        }

        impl $crate::bitset::BitFlag for $name {
            const MAX_BIT_OFFSET: u32 =
                (<Self as $crate::enum_field::CEnum>::VARIANTS.len() - 1) as u32;

            fn to_bit_offset(self) -> u32 {
                self as u32
            }

            fn from_bit_offset(offset: u32) -> Option<Self> {
                <Self as $crate::enum_field::CEnum>::VARIANTS
                    .get(offset as usize)
                    .copied()
            }
        }
    };
}

/// Declares an enum whose last variant carries every code past the plain ones.
///
/// ```
/// use abi_layout_core::open_enum;
/// use abi_layout_core::enum_field::{decode_open, decode_open_maybe};
///
/// open_enum! {
///     pub enum Access { Mmap, RwInterleaved, ..Other }
/// }
///
/// assert_eq!(decode_open::<Access>(1), Access::RwInterleaved);
/// assert_eq!(decode_open::<Access>(5), Access::Other(3));
/// assert_eq!(decode_open_maybe::<Access>(5), None);
/// ```
#[macro_export]
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident,)+
            ..$other:ident $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vmeta])* $variant,)+
            $other(u64),
        }

        impl $crate::enum_field::OpenEnum for $name {
            const PLAIN: &'static [Self] = &[$(Self::$variant),+];

            fn overflow(residual: u64) -> Self {
                Self::$other(residual)
            }

            fn residual(&self) -> Option<u64> {
                match self {
                    Self::$other(residual) => Some(*residual),
                    _ => None,
                }
            }
        }

        impl $crate::enum_field::CEnum for $name {
            const VARIANTS: &'static [Self] = <Self as $crate::enum_field::OpenEnum>::PLAIN;

            fn to_code(self) -> i128 {
                $crate::enum_field::encode_open(self) as i128
            }

            fn from_code(code: i128) -> Option<Self> {
                u64::try_from(code)
                    .ok()
                    .map($crate::enum_field::decode_open)
            }
        }
    };
}
