//! Runtime type system: scalar layouts, registry and dynamic values.
//!
//! This is the capability interface behind schema-driven record access:
//! every registered type knows its size, alignment and how to decode and
//! encode a [`Value`].

mod builtin_types;
mod error;
mod type_layout;
mod type_registry;
mod value;

pub use builtin_types::register_builtin_types;
pub use error::TypeError;
pub use type_layout::{DecoderFn, EncoderFn, TypeLayout};
pub use type_registry::TypeRegistry;
pub use value::{Value, ValueType};
