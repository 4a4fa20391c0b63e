//! Serializable record descriptors and schema files.
//!
//! A schema file lists record descriptors in dependency order together with
//! a CRC32 fingerprint of each computed layout. Loading recomputes every
//! layout and rejects files whose stored offsets or fingerprints disagree.

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::error::{AbiError, LayoutError, Result};
use crate::record::{FieldDef, RecordSchema};
use crate::types::TypeRegistry;

/// Current schema file version.
pub const SCHEMA_VERSION: u32 = 1;

/// Field entry of a record descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// Type name (`u32`, `be:u16`, `[u8; 16]`, or a record name)
    pub r#type: String,
    /// Byte offset recorded when the descriptor was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Declarative form of a record schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDescriptor {
    /// Record name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Describes a computed schema, including its offsets.
    pub fn from_schema(schema: &RecordSchema) -> Self {
        Self {
            name: schema.name().to_string(),
            fields: schema
                .fields()
                .iter()
                .map(|field| FieldDescriptor {
                    name: field.name.clone(),
                    r#type: field.kind.type_name(),
                    offset: Some(field.offset),
                })
                .collect(),
        }
    }

    /// Computes the layout of this descriptor against `registry`.
    ///
    /// Field types must already be registered. Stored offsets, when present,
    /// must match the computed ones.
    pub fn build(&self, registry: &TypeRegistry) -> std::result::Result<RecordSchema, LayoutError> {
        let mut defs = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            defs.push(FieldDef::new(
                field.name.clone(),
                registry.resolve_kind(&field.r#type)?,
            ));
        }
        let schema = RecordSchema::with_config(self.name.clone(), defs, registry.config())?;

        for (stored, field) in self.fields.iter().zip(schema.fields()) {
            if let Some(offset) = stored.offset {
                if offset != field.offset {
                    return Err(LayoutError::OffsetMismatch {
                        record: self.name.clone(),
                        field: field.name.clone(),
                        stored: offset,
                        computed: field.offset,
                    });
                }
            }
        }
        Ok(schema)
    }
}

/// CRC32 over the record's `(name, offset, size, align)` field tuples and
/// its full size and alignment.
pub fn fingerprint(schema: &RecordSchema) -> u32 {
    let mut hasher = Hasher::new();
    for field in schema.fields() {
        hasher.update(field.name.as_bytes());
        hasher.update(&[0]);
        hasher.update(&(field.offset as u64).to_le_bytes());
        hasher.update(&(field.size as u64).to_le_bytes());
        hasher.update(&(field.align as u64).to_le_bytes());
    }
    hasher.update(&(schema.full_size() as u64).to_le_bytes());
    hasher.update(&(schema.alignment() as u64).to_le_bytes());
    hasher.finalize()
}

/// Schema file format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Schema version
    pub version: u32,
    /// Record descriptors, dependencies first
    pub records: Vec<RecordDescriptor>,
    /// Layout fingerprints by record name
    #[serde(default)]
    pub fingerprints: HashMap<String, u32>,
}

impl Default for SchemaFile {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            records: Vec::new(),
            fingerprints: HashMap::new(),
        }
    }
}

impl SchemaFile {
    /// Builds a schema file from computed schemas, in the given order.
    pub fn from_schemas<'a>(schemas: impl IntoIterator<Item = &'a RecordSchema>) -> Self {
        let mut file = Self::default();
        for schema in schemas {
            file.fingerprints
                .insert(schema.name().to_string(), fingerprint(schema));
            file.records.push(RecordDescriptor::from_schema(schema));
        }
        file
    }

    /// Describes every record registered in `registry`.
    pub fn from_registry(registry: &TypeRegistry) -> Self {
        let mut schemas: Vec<Arc<RecordSchema>> = registry
            .record_names()
            .iter()
            .filter_map(|name| registry.record(name))
            .collect();
        // Nested records are strictly shallower than the records that embed them
        schemas.sort_by(|a, b| {
            a.depth()
                .cmp(&b.depth())
                .then_with(|| a.name().cmp(b.name()))
        });
        Self::from_schemas(schemas.iter().map(|s| s.as_ref()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: SchemaFile = serde_json::from_str(json)?;
        if file.version != SCHEMA_VERSION {
            return Err(LayoutError::InvalidDescriptor(format!(
                "unsupported schema version: {}",
                file.version
            ))
            .into());
        }
        Ok(file)
    }

    /// Writes the file as pretty JSON, replacing `path` atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        let temp_path = path.with_extension("json.tmp");

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;

        tracing::debug!(
            path = %path.display(),
            records = self.records.len(),
            "Saved schema file"
        );
        Ok(())
    }

    /// Reads and parses a schema file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut contents = String::new();
        File::open(path)?.read_to_string(&mut contents)?;
        let file = Self::from_json(&contents)?;
        tracing::debug!(
            path = %path.display(),
            records = file.records.len(),
            "Loaded schema file"
        );
        Ok(file)
    }

    /// Computes and registers every record in file order.
    ///
    /// Records already present in `registry` are reused if their layout
    /// matches. Each computed layout is checked against the stored
    /// fingerprint when one is present. On error, records added by this
    /// call are removed again and the registry is left as it was.
    pub fn register_all(&self, registry: &TypeRegistry) -> Result<Vec<Arc<RecordSchema>>> {
        let mut inserted = Vec::new();
        let outcome = self.register_each(registry, &mut inserted);
        if outcome.is_err() && !inserted.is_empty() {
            for name in inserted.iter().rev() {
                registry.remove(name);
            }
            tracing::warn!(
                rolled_back = inserted.len(),
                "Schema file registration failed"
            );
        }
        outcome
    }

    fn register_each(
        &self,
        registry: &TypeRegistry,
        inserted: &mut Vec<String>,
    ) -> Result<Vec<Arc<RecordSchema>>> {
        let mut registered = Vec::with_capacity(self.records.len());
        for descriptor in &self.records {
            let schema = descriptor.build(registry)?;
            let computed = fingerprint(&schema);

            if let Some(&stored) = self.fingerprints.get(&descriptor.name) {
                if stored != computed {
                    tracing::warn!(
                        record = %descriptor.name,
                        stored,
                        computed,
                        "Record layout fingerprint mismatch"
                    );
                    return Err(LayoutError::FingerprintMismatch {
                        record: descriptor.name.clone(),
                        stored,
                        computed,
                    }
                    .into());
                }
            }

            let schema = match registry.record(&descriptor.name) {
                Some(existing) => {
                    let existing_fingerprint = fingerprint(&existing);
                    if existing_fingerprint != computed {
                        return Err(LayoutError::FingerprintMismatch {
                            record: descriptor.name.clone(),
                            stored: existing_fingerprint,
                            computed,
                        }
                        .into());
                    }
                    existing
                }
                None => {
                    let schema = registry.register_record(schema)?;
                    inserted.push(descriptor.name.clone());
                    schema
                }
            };
            registered.push(schema);
        }
        Ok(registered)
    }
}

/// Loads a schema file and registers its records.
pub fn load_into(
    path: impl AsRef<Path>,
    registry: &TypeRegistry,
) -> std::result::Result<Vec<Arc<RecordSchema>>, AbiError> {
    SchemaFile::load(path)?.register_all(registry)
}
