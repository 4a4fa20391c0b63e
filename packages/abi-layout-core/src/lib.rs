//! C-ABI compatible binary storage layer.
//!
//! Provides storable primitives with explicit byte order, integer-backed
//! bit sets and enum fields, record schemas whose layout matches native C
//! structs, fixed-length vectors, fixed-point numbers and SORN sets, plus
//! JSON schema descriptors and reference kernel structures.

#[macro_use]
mod macros;

pub mod abi;
pub mod bitset;
pub mod config;
pub mod descriptor;
pub mod enum_field;
pub mod error;
pub mod fixed_point;
pub mod record;
pub mod sorn;
pub mod storable;
pub mod types;
pub mod vector;
pub mod word;

pub use config::LayoutConfig;
pub use error::{AbiError, BoundsError, DecodeError, LayoutError, RangeError};
pub use record::{FieldDef, FieldKind, Record, RecordSchema};
pub use storable::Storable;
pub use types::TypeRegistry;
