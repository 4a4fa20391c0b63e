//! Record schemas: field offsets computed once at registration.

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::error::{BoundsError, LayoutError};
use crate::storable::check_bounds;
use crate::types::Value;

use super::field::{Field, FieldDef, FieldKind};
use super::validation;

/// Memoized layout of a C-compatible record.
///
/// Offsets follow native C struct layout with default packing: each field
/// is placed at the running size rounded up to its alignment, the record
/// alignment is the largest field alignment (1 when empty), and the full
/// size adds trailing padding up to that alignment.
#[derive(Debug)]
pub struct RecordSchema {
    name: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    record_size: usize,
    full_size: usize,
    alignment: usize,
    depth: usize,
}

/// Padding inserted by a layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Padding {
    /// Padding before each field, in declaration order
    pub leading: Vec<usize>,
    /// Padding after the last field
    pub trailing: usize,
}

impl Padding {
    pub fn total(&self) -> usize {
        self.leading.iter().sum::<usize>() + self.trailing
    }
}

/// Field reached through a [`FieldPath`].
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'a> {
    /// Offset from the start of the outermost record
    pub offset: usize,
    /// The innermost field
    pub field: &'a Field,
}

/// Sequence of field names leading through nested records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Parses a dotted path such as `"ts.tv_sec"`.
    pub fn parse(path: &str) -> Self {
        Self(path.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<&[&str]> for FieldPath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldPath {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

fn checked_size(kind: &FieldKind) -> Option<usize> {
    match kind {
        FieldKind::Array { element, len } => checked_size(element)?.checked_mul(*len),
        other => Some(other.size()),
    }
}

impl RecordSchema {
    /// Computes the layout of `fields` with the default configuration.
    pub fn new(name: impl Into<String>, fields: Vec<FieldDef>) -> Result<Self, LayoutError> {
        Self::with_config(name, fields, &LayoutConfig::default())
    }

    /// Computes the layout of `fields`.
    ///
    /// # Arguments
    /// * `name` - Record name
    /// * `defs` - Field declarations in order
    /// * `config` - Size and nesting limits
    ///
    /// # Returns
    /// `Err(LayoutError)` on duplicate names, arithmetic overflow or
    /// exceeded limits.
    pub fn with_config(
        name: impl Into<String>,
        defs: Vec<FieldDef>,
        config: &LayoutConfig,
    ) -> Result<Self, LayoutError> {
        let name = name.into();
        let mut fields = Vec::with_capacity(defs.len());
        let mut index = HashMap::with_capacity(defs.len());
        let mut offset = 0usize;
        let mut alignment = 1usize;
        let mut depth = 0usize;

        for def in defs {
            if index.contains_key(&def.name) {
                return Err(LayoutError::DuplicateField {
                    record: name,
                    field: def.name,
                });
            }

            let size = checked_size(&def.kind).ok_or(LayoutError::CapacityOverflow {
                operation: "array size calculation",
            })?;
            let align = def.kind.align();
            let field_offset = validation::align_offset(offset, align)?;
            offset = field_offset
                .checked_add(size)
                .ok_or(LayoutError::CapacityOverflow {
                    operation: "field placement",
                })?;
            alignment = alignment.max(align);
            depth = depth.max(def.kind.depth());

            index.insert(def.name.clone(), fields.len());
            fields.push(Field {
                name: def.name,
                kind: def.kind,
                offset: field_offset,
                size,
                align,
            });
        }

        if depth > config.max_nesting_depth {
            return Err(LayoutError::NestingTooDeep {
                record: name,
                depth,
                limit: config.max_nesting_depth,
            });
        }

        let record_size = validation::calculate_record_size(&fields)?;
        let full_size = validation::align_offset(record_size, alignment)?;
        if full_size > config.max_record_size {
            return Err(LayoutError::RecordTooLarge {
                record: name,
                size: full_size,
                limit: config.max_record_size,
            });
        }
        debug_assert!(validation::validate_field_layout(&fields).is_ok());

        tracing::debug!(
            record = %name,
            fields = fields.len(),
            size = record_size,
            full_size,
            align = alignment,
            "Computed record layout"
        );

        Ok(Self {
            name,
            fields,
            index,
            record_size,
            full_size,
            alignment,
            depth,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Result<&Field, LayoutError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| LayoutError::FieldNotFound {
                record: self.name.clone(),
                field: name.to_string(),
            })
    }

    /// Returns the byte offset of a field.
    pub fn field_offset(&self, name: &str) -> Result<usize, LayoutError> {
        self.field(name).map(|f| f.offset)
    }

    /// Logical size: end of the last field, without trailing padding.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Allocated size: logical size rounded up to the record alignment.
    pub fn full_size(&self) -> usize {
        self.full_size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the padding inserted before each field and after the last.
    pub fn padding(&self) -> Padding {
        let mut cursor = 0;
        let leading = self
            .fields
            .iter()
            .map(|field| {
                let pad = field.offset - cursor;
                cursor = field.end_offset();
                pad
            })
            .collect();
        Padding {
            leading,
            trailing: self.full_size - self.record_size,
        }
    }

    /// Resolves a path through nested records, accumulating offsets.
    pub fn resolve(&self, path: &FieldPath) -> Result<ResolvedField<'_>, LayoutError> {
        let (last, parents) =
            path.segments()
                .split_last()
                .ok_or_else(|| LayoutError::FieldNotFound {
                    record: self.name.clone(),
                    field: String::new(),
                })?;

        let mut schema = self;
        let mut offset = 0;
        for segment in parents {
            let field = schema.field(segment)?;
            offset += field.offset;
            schema = match &field.kind {
                FieldKind::Record(inner) => inner.as_ref(),
                _ => {
                    return Err(LayoutError::NotARecord {
                        record: schema.name.clone(),
                        field: segment.clone(),
                    })
                }
            };
        }

        let field = schema.field(last)?;
        Ok(ResolvedField {
            offset: offset + field.offset,
            field,
        })
    }

    /// Walks the fields of a record image, producing `(name, value)` pairs.
    ///
    /// `bytes` must hold at least `record_size` bytes.
    pub fn decode_fields(&self, bytes: &[u8]) -> Result<Vec<(String, Value)>, BoundsError> {
        check_bounds(bytes.len(), 0, self.record_size)?;
        Ok(self.decode_image(bytes))
    }

    pub(crate) fn decode_image(&self, bytes: &[u8]) -> Vec<(String, Value)> {
        self.fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    field.kind.decode(&bytes[field.offset..field.end_offset()]),
                )
            })
            .collect()
    }
}
