//! Dynamically typed field values.

use serde::{Deserialize, Serialize};

use crate::storable::{BigEndian, ByteSwap, LittleEndian, Storable};

/// A decoded field value.
///
/// Produced when a record is walked through its schema rather than
/// through typed accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Unit,
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    /// Pointer-sized word
    Ptr(usize),
    /// Opaque bytes or a byte array
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Nested record as an ordered association list
    Record(Vec<(String, Value)>),
}

impl Value {
    /// Returns the variant name, used in mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::U16(_) => "u16",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I8(_) => "i8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Ptr(_) => "ptr",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Record(_) => "record",
        }
    }

    /// Looks up a field of a record value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Storable types with a registry name and a [`Value`] representation.
pub trait ValueType: Storable {
    /// Registry identifier (e.g. "u32", "be:u16")
    fn type_id() -> String;

    fn into_value(self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_value_type {
    ($($t:ty => $variant:ident, $id:literal);* $(;)?) => {
        $(
            impl ValueType for $t {
                fn type_id() -> String {
                    $id.to_string()
                }

                fn into_value(self) -> Value {
                    Value::$variant(self)
                }

                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(*v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_value_type! {
    bool => Bool, "bool";
    u8 => U8, "u8";
    u16 => U16, "u16";
    u32 => U32, "u32";
    u64 => U64, "u64";
    i8 => I8, "i8";
    i16 => I16, "i16";
    i32 => I32, "i32";
    i64 => I64, "i64";
    f32 => F32, "f32";
    f64 => F64, "f64";
    usize => Ptr, "usize";
}

impl ValueType for isize {
    fn type_id() -> String {
        "isize".to_string()
    }

    fn into_value(self) -> Value {
        Value::I64(self as i64)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::I64(v) => isize::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl<T> ValueType for *const T {
    fn type_id() -> String {
        "ptr".to_string()
    }

    fn into_value(self) -> Value {
        Value::Ptr(self as usize)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Ptr(v) => Some(*v as *const T),
            _ => None,
        }
    }
}

impl<T: ValueType + ByteSwap> ValueType for BigEndian<T> {
    fn type_id() -> String {
        format!("be:{}", T::type_id())
    }

    fn into_value(self) -> Value {
        self.0.into_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(BigEndian)
    }
}

impl<T: ValueType + ByteSwap> ValueType for LittleEndian<T> {
    fn type_id() -> String {
        format!("le:{}", T::type_id())
    }

    fn into_value(self) -> Value {
        self.0.into_value()
    }

    fn from_value(value: &Value) -> Option<Self> {
        T::from_value(value).map(LittleEndian)
    }
}
