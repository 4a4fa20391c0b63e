//! Record instances: a shared schema plus an owned byte image.

use std::sync::Arc;

use crate::error::{LayoutError, Result};
use crate::storable::Storable;
use crate::types::Value;

use super::buffer::AlignedBuffer;
use super::field::Field;
use super::schema::{FieldPath, RecordSchema};

/// A record image laid out according to its schema.
///
/// The record exclusively owns its `full_size` bytes, aligned to the
/// record alignment. Cloning duplicates the bytes.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    buffer: AlignedBuffer,
}

fn check_size<T: Storable>(field: &Field) -> std::result::Result<(), LayoutError> {
    if field.size != T::SIZE {
        return Err(LayoutError::TypeMismatch {
            field: field.name.clone(),
            expected: format!("{} bytes", field.size),
            got: format!("{} bytes", T::SIZE),
        });
    }
    Ok(())
}

impl Record {
    /// Allocates a zero-filled record.
    pub fn new_zeroed(schema: Arc<RecordSchema>) -> Result<Self> {
        let buffer = AlignedBuffer::zeroed(schema.full_size(), schema.alignment())?;
        Ok(Self { schema, buffer })
    }

    /// Copies a record image; `bytes` must be exactly `full_size` long.
    pub fn from_bytes(schema: Arc<RecordSchema>, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != schema.full_size() {
            return Err(LayoutError::LengthMismatch {
                expected: schema.full_size(),
                got: bytes.len(),
            }
            .into());
        }
        let buffer = AlignedBuffer::from_slice(bytes, schema.alignment())?;
        Ok(Self { schema, buffer })
    }

    /// Copies `full_size` bytes starting at `ptr` into a new record.
    ///
    /// # Safety
    /// `ptr` must be valid for reads of `schema.full_size()` bytes.
    pub unsafe fn peek(schema: Arc<RecordSchema>, ptr: *const u8) -> Result<Self> {
        let bytes = std::slice::from_raw_parts(ptr, schema.full_size());
        Self::from_bytes(schema, bytes)
    }

    /// Copies the record's `full_size` bytes to `ptr`.
    ///
    /// # Safety
    /// `ptr` must be valid for writes of `full_size` bytes and must not
    /// overlap this record's buffer.
    pub unsafe fn poke(&self, ptr: *mut u8) {
        std::ptr::copy_nonoverlapping(self.buffer.as_ptr(), ptr, self.buffer.len());
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.buffer.as_mut_slice()
    }

    /// Pointer to the aligned image, for passing to system calls.
    pub fn as_ptr(&self) -> *const u8 {
        self.buffer.as_ptr()
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.buffer.as_mut_ptr()
    }

    /// Reads a field as `T`; `T::SIZE` must equal the field size.
    pub fn get<T: Storable>(&self, name: &str) -> Result<T> {
        let field = self.schema.field(name)?;
        check_size::<T>(field)?;
        Ok(T::read(self.as_bytes(), field.offset)?)
    }

    /// Writes a field as `T`; `T::SIZE` must equal the field size.
    pub fn set<T: Storable>(&mut self, name: &str, value: T) -> Result<()> {
        let field = self.schema.field(name)?;
        check_size::<T>(field)?;
        let offset = field.offset;
        value.write(self.buffer.as_mut_slice(), offset)?;
        Ok(())
    }

    /// Reads a field reached through nested records.
    pub fn get_path<T: Storable>(&self, path: impl Into<FieldPath>) -> Result<T> {
        let path = path.into();
        let resolved = self.schema.resolve(&path)?;
        check_size::<T>(resolved.field)?;
        Ok(T::read(self.as_bytes(), resolved.offset)?)
    }

    /// Writes a field reached through nested records.
    pub fn set_path<T: Storable>(&mut self, path: impl Into<FieldPath>, value: T) -> Result<()> {
        let path = path.into();
        let offset = {
            let resolved = self.schema.resolve(&path)?;
            check_size::<T>(resolved.field)?;
            resolved.offset
        };
        value.write(self.buffer.as_mut_slice(), offset)?;
        Ok(())
    }

    /// Decodes a field through its schema type.
    pub fn value(&self, name: &str) -> Result<Value> {
        let field = self.schema.field(name)?;
        Ok(field
            .kind
            .decode(&self.as_bytes()[field.offset..field.end_offset()]))
    }

    /// Encodes a field through its schema type.
    ///
    /// On error the field is left unchanged.
    pub fn set_value(&mut self, name: &str, value: &Value) -> Result<()> {
        let schema = self.schema.clone();
        let field = schema.field(name)?;
        let bytes = &mut self.buffer.as_mut_slice()[field.offset..field.end_offset()];
        // Nested values are encoded into a scratch copy and committed whole
        let mut scratch = bytes.to_vec();
        field.kind.encode(name, value, &mut scratch)?;
        bytes.copy_from_slice(&scratch);
        Ok(())
    }

    /// Copies a nested record field out as a record of its own.
    pub fn sub_record(&self, name: &str) -> Result<Record> {
        let field = self.schema.field(name)?;
        match &field.kind {
            super::FieldKind::Record(inner) => Record::from_bytes(
                inner.clone(),
                &self.as_bytes()[field.offset..field.end_offset()],
            ),
            _ => Err(LayoutError::NotARecord {
                record: self.schema.name().to_string(),
                field: name.to_string(),
            }
            .into()),
        }
    }

    /// Walks the schema, producing `(name, value)` pairs in field order.
    pub fn to_assoc_list(&self) -> Vec<(String, Value)> {
        self.schema.decode_image(self.as_bytes())
    }

    /// Whole record as a [`Value::Record`].
    pub fn to_value(&self) -> Value {
        Value::Record(self.to_assoc_list())
    }
}

/// Reads one field at `base + offset` without copying the record.
///
/// # Safety
/// `base` must point to a record image of `schema` valid for reads.
pub unsafe fn peek_field<T: Storable>(
    schema: &RecordSchema,
    base: *const u8,
    name: &str,
) -> std::result::Result<T, LayoutError> {
    let field = schema.field(name)?;
    check_size::<T>(field)?;
    let bytes = std::slice::from_raw_parts(base.add(field.offset), T::SIZE);
    Ok(T::decode(bytes))
}

/// Writes one field at `base + offset` without touching the rest of the record.
///
/// # Safety
/// `base` must point to a record image of `schema` valid for writes.
pub unsafe fn poke_field<T: Storable>(
    schema: &RecordSchema,
    base: *mut u8,
    name: &str,
    value: T,
) -> std::result::Result<(), LayoutError> {
    let field = schema.field(name)?;
    check_size::<T>(field)?;
    let bytes = std::slice::from_raw_parts_mut(base.add(field.offset), T::SIZE);
    value.encode(bytes);
    Ok(())
}

/// Runs `f` with a zeroed, aligned record that is released on every exit path.
///
/// This is the scoped buffer acquisition used around system calls: the
/// buffer lives exactly as long as `f`, including when `f` returns an error
/// or unwinds.
pub fn with_scoped_record<R>(
    schema: &Arc<RecordSchema>,
    f: impl FnOnce(&mut Record) -> R,
) -> Result<R> {
    let mut record = Record::new_zeroed(schema.clone())?;
    Ok(f(&mut record))
}
