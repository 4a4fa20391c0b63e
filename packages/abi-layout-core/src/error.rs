//! Layout, decode, bounds and range error types.

use thiserror::Error;

use crate::types::TypeError;

/// Construction-time errors raised while building schemas, records and vectors.
///
/// These are detected before any buffer is read or written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Field not found in record
    #[error("Field '{field}' not found in record '{record}'")]
    FieldNotFound { record: String, field: String },

    /// Field declared twice in the same record
    #[error("Field '{field}' already exists in record '{record}'")]
    DuplicateField { record: String, field: String },

    /// Element count does not match the fixed length
    #[error("Length mismatch: expected {expected} elements, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    /// Typed access does not match the field type
    #[error("Type mismatch for field '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: String,
        got: String,
    },

    /// Path component is not a nested record
    #[error("Field '{field}' in record '{record}' is not a record")]
    NotARecord { record: String, field: String },

    /// Record nesting exceeds the configured limit
    #[error("Record '{record}' nesting depth {depth} exceeds limit {limit}")]
    NestingTooDeep {
        record: String,
        depth: usize,
        limit: usize,
    },

    /// Offset arithmetic overflow
    #[error("Capacity overflow during {operation}")]
    CapacityOverflow { operation: &'static str },

    /// Record exceeds the configured maximum size
    #[error("Record '{record}' size {size} exceeds limit {limit}")]
    RecordTooLarge {
        record: String,
        size: usize,
        limit: usize,
    },

    /// Enum codes are duplicated or do not round-trip
    #[error("Enum {type_name} mapping is not bijective at code {code}")]
    NonBijectiveEnum { type_name: &'static str, code: i128 },

    /// Type name not known to the registry
    #[error("Unknown type '{type_name}'")]
    UnknownType { type_name: String },

    /// Descriptor offsets disagree with the computed layout
    #[error("Field '{field}' in record '{record}': stored offset {stored}, computed {computed}")]
    OffsetMismatch {
        record: String,
        field: String,
        stored: usize,
        computed: usize,
    },

    /// Descriptor fingerprint disagrees with the computed layout
    #[error("Fingerprint mismatch for record '{record}': stored {stored:#010x}, computed {computed:#010x}")]
    FingerprintMismatch {
        record: String,
        stored: u32,
        computed: u32,
    },

    /// Malformed descriptor
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),
}

/// A raw code with no defined symbolic mapping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No {type_name} mapping for raw value {raw:#x}")]
pub struct DecodeError {
    /// Name of the target type
    pub type_name: &'static str,
    /// Offending raw value (bit pattern, zero-extended)
    pub raw: u128,
}

/// Access outside a buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Access of {size} bytes at offset {offset} exceeds buffer length {len}")]
pub struct BoundsError {
    pub offset: usize,
    pub size: usize,
    pub len: usize,
}

/// A numeric value that does not fit its backing word.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Value {value} out of range for {type_name}")]
pub struct RangeError {
    pub type_name: &'static str,
    pub value: String,
}

/// Umbrella error for operations spanning several categories.
#[derive(Error, Debug)]
pub enum AbiError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Type(#[from] TypeError),

    /// I/O error while reading or writing descriptor files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Descriptor (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AbiError>;
