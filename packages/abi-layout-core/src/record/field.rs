//! Field declarations and resolved fields within a record.

use std::sync::Arc;

use crate::error::LayoutError;
use crate::types::{TypeLayout, Value, ValueType};

use super::schema::RecordSchema;

/// Type of a field.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Registered scalar type
    Scalar(TypeLayout),
    /// Nested record, laid out with its full (trailing-padded) size
    Record(Arc<RecordSchema>),
    /// Fixed-length array of contiguous elements
    Array { element: Box<FieldKind>, len: usize },
}

impl FieldKind {
    /// Scalar kind for a [`ValueType`].
    pub fn of<T: ValueType + 'static>() -> Self {
        FieldKind::Scalar(TypeLayout::of::<T>())
    }

    /// Array of `len` elements of `element`.
    pub fn array(element: FieldKind, len: usize) -> Self {
        FieldKind::Array {
            element: Box::new(element),
            len,
        }
    }

    /// Size in bytes (saturating; oversized arrays are rejected by the schema).
    pub fn size(&self) -> usize {
        match self {
            FieldKind::Scalar(layout) => layout.size,
            FieldKind::Record(schema) => schema.full_size(),
            FieldKind::Array { element, len } => element.size().saturating_mul(*len),
        }
    }

    /// Alignment requirement in bytes.
    pub fn align(&self) -> usize {
        match self {
            FieldKind::Scalar(layout) => layout.align,
            FieldKind::Record(schema) => schema.alignment(),
            FieldKind::Array { element, .. } => element.align(),
        }
    }

    /// Number of record levels below this kind.
    pub fn depth(&self) -> usize {
        match self {
            FieldKind::Scalar(_) => 0,
            FieldKind::Record(schema) => schema.depth() + 1,
            FieldKind::Array { element, .. } => element.depth(),
        }
    }

    /// Type name as written in descriptors (`u32`, `timespec`, `[u8; 16]`).
    pub fn type_name(&self) -> String {
        match self {
            FieldKind::Scalar(layout) => layout.type_id.clone(),
            FieldKind::Record(schema) => schema.name().to_string(),
            FieldKind::Array { element, len } => format!("[{}; {}]", element.type_name(), len),
        }
    }

    fn is_byte(&self) -> bool {
        matches!(self, FieldKind::Scalar(layout) if layout.type_id == "u8")
    }

    /// Decodes a value from exactly `size()` bytes.
    pub(crate) fn decode(&self, bytes: &[u8]) -> Value {
        match self {
            FieldKind::Scalar(layout) => layout.decode(bytes),
            FieldKind::Record(schema) => Value::Record(schema.decode_image(bytes)),
            FieldKind::Array { element, len } if element.is_byte() => {
                Value::Bytes(bytes[..*len].to_vec())
            }
            FieldKind::Array { element, len } => {
                let step = element.size();
                Value::Array(
                    (0..*len)
                        .map(|i| element.decode(&bytes[i * step..(i + 1) * step]))
                        .collect(),
                )
            }
        }
    }

    /// Encodes a value into exactly `size()` bytes.
    ///
    /// `field` names the enclosing field in error reports.
    pub(crate) fn encode(&self, field: &str, value: &Value, bytes: &mut [u8]) -> Result<(), LayoutError> {
        match (self, value) {
            (FieldKind::Scalar(layout), value) => {
                layout
                    .encode(value, bytes)
                    .map_err(|_| LayoutError::TypeMismatch {
                        field: field.to_string(),
                        expected: layout.type_id.clone(),
                        got: value.kind().to_string(),
                    })
            }
            (FieldKind::Record(schema), Value::Record(pairs)) => {
                for (name, inner) in pairs {
                    let inner_field = schema.field(name)?;
                    inner_field.kind.encode(
                        name,
                        inner,
                        &mut bytes[inner_field.offset..inner_field.end_offset()],
                    )?;
                }
                Ok(())
            }
            (FieldKind::Array { element, len }, Value::Bytes(raw)) if element.is_byte() => {
                if raw.len() != *len {
                    return Err(LayoutError::LengthMismatch {
                        expected: *len,
                        got: raw.len(),
                    });
                }
                bytes[..*len].copy_from_slice(raw);
                Ok(())
            }
            (FieldKind::Array { element, len }, Value::Array(items)) => {
                if items.len() != *len {
                    return Err(LayoutError::LengthMismatch {
                        expected: *len,
                        got: items.len(),
                    });
                }
                let step = element.size();
                for (i, item) in items.iter().enumerate() {
                    element.encode(field, item, &mut bytes[i * step..(i + 1) * step])?;
                }
                Ok(())
            }
            (kind, value) => Err(LayoutError::TypeMismatch {
                field: field.to_string(),
                expected: kind.type_name(),
                got: value.kind().to_string(),
            }),
        }
    }
}

/// Field declaration: a name and a kind, before layout.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name, unique within its record
    pub name: String,
    /// Field type
    pub kind: FieldKind,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Declares a scalar field of a [`ValueType`].
    pub fn scalar<T: ValueType + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::of::<T>())
    }

    /// Declares a nested record field.
    pub fn record(name: impl Into<String>, schema: Arc<RecordSchema>) -> Self {
        Self::new(name, FieldKind::Record(schema))
    }
}

/// Field resolved within a record layout.
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Field type
    pub kind: FieldKind,
    /// Byte offset within record
    pub offset: usize,
    /// Field size in bytes (derived from the kind)
    pub size: usize,
    /// Field alignment requirement (derived from the kind)
    pub align: usize,
}

impl Field {
    /// Returns the end offset of this field (offset + size).
    pub fn end_offset(&self) -> usize {
        self.offset + self.size
    }
}
