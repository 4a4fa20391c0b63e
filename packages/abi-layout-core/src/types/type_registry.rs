use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::error::TypeError;
use super::type_layout::TypeLayout;
use crate::config::LayoutConfig;
use crate::error::{AbiError, LayoutError};
use crate::record::{FieldKind, RecordSchema};

/// Registry for type layouts and record schemas.
///
/// Stores scalar types and registered records with lookup by name.
/// Provides thread-safe registration and retrieval.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<String, TypeLayout>>,
    records: RwLock<HashMap<String, Arc<RecordSchema>>>,
    config: LayoutConfig,
}

impl TypeRegistry {
    /// Creates a new empty type registry.
    pub fn new() -> Self {
        Self {
            types: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
            config: LayoutConfig::default(),
        }
    }

    /// Creates a registry holding the built-in scalar types and, if
    /// configured, the reference kernel records.
    pub fn with_config(config: LayoutConfig) -> Result<Self, AbiError> {
        let registry = Self {
            types: RwLock::new(HashMap::new()),
            records: RwLock::new(HashMap::new()),
            config,
        };
        super::builtin_types::register_builtin_types(&registry)?;
        if registry.config.register_abi_records {
            crate::abi::register_abi_records(&registry)?;
        }
        tracing::debug!(
            types = registry.type_ids().len(),
            records = registry.record_names().len(),
            "Type registry initialised"
        );
        Ok(registry)
    }

    /// Returns the configuration used for schemas built through this registry.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Registers a type layout.
    ///
    /// # Arguments
    /// * `layout` - Type layout to register
    ///
    /// # Returns
    /// `Ok(())` if successful, `Err(TypeError)` if type already registered or invalid.
    pub fn register(&self, layout: TypeLayout) -> Result<(), TypeError> {
        layout.validate()?;

        let mut types = self
            .types
            .write()
            .map_err(|_| TypeError::ValidationFailed {
                type_id: layout.type_id.clone(),
                message: "failed to acquire write lock".to_string(),
            })?;

        if types.contains_key(&layout.type_id) {
            return Err(TypeError::AlreadyRegistered {
                type_id: layout.type_id.clone(),
            });
        }

        types.insert(layout.type_id.clone(), layout);
        Ok(())
    }

    /// Retrieves a type layout by identifier.
    pub fn get(&self, type_id: &str) -> Option<TypeLayout> {
        let types = self.types.read().ok()?;
        types.get(type_id).cloned()
    }

    /// Checks if a type is registered.
    pub fn contains(&self, type_id: &str) -> bool {
        let types = match self.types.read() {
            Ok(guard) => guard,
            Err(_) => return false,
        };
        types.contains_key(type_id)
    }

    /// Returns all registered type identifiers.
    pub fn type_ids(&self) -> Vec<String> {
        let types = match self.types.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        types.keys().cloned().collect()
    }

    /// Removes a record schema or type registration by name.
    ///
    /// Records that already reference the removed schema keep their own
    /// `Arc`; only lookups by name are affected.
    ///
    /// # Returns
    /// `true` if a registration was removed, `false` if it wasn't found.
    pub fn remove(&self, name: &str) -> bool {
        if let Ok(mut records) = self.records.write() {
            if records.remove(name).is_some() {
                tracing::debug!(record = %name, "Removed record schema");
                return true;
            }
        }
        match self.types.write() {
            Ok(mut types) => types.remove(name).is_some(),
            Err(_) => false,
        }
    }

    /// Registers a record schema under its name.
    ///
    /// Returns the shared schema that records of this type reference.
    pub fn register_record(&self, schema: RecordSchema) -> Result<Arc<RecordSchema>, TypeError> {
        let name = schema.name().to_string();
        if self.contains(&name) {
            return Err(TypeError::AlreadyRegistered { type_id: name });
        }

        let mut records = self
            .records
            .write()
            .map_err(|_| TypeError::ValidationFailed {
                type_id: name.clone(),
                message: "failed to acquire write lock".to_string(),
            })?;

        if records.contains_key(&name) {
            return Err(TypeError::AlreadyRegistered { type_id: name });
        }

        let schema = Arc::new(schema);
        tracing::debug!(
            record = %name,
            size = schema.record_size(),
            full_size = schema.full_size(),
            align = schema.alignment(),
            "Registered record schema"
        );
        records.insert(name, schema.clone());
        Ok(schema)
    }

    /// Retrieves a record schema by name.
    pub fn record(&self, name: &str) -> Option<Arc<RecordSchema>> {
        let records = self.records.read().ok()?;
        records.get(name).cloned()
    }

    /// Returns all registered record names.
    pub fn record_names(&self) -> Vec<String> {
        let records = match self.records.read() {
            Ok(guard) => guard,
            Err(_) => return Vec::new(),
        };
        records.keys().cloned().collect()
    }

    /// Resolves a type name to a field kind.
    ///
    /// Accepts registered scalar ids (`u32`, `be:u16`), registered record
    /// names, and fixed arrays of either (`[u8; 16]`, `[timespec; 2]`).
    pub fn resolve_kind(&self, type_name: &str) -> Result<FieldKind, LayoutError> {
        let type_name = type_name.trim();
        if let Some(inner) = type_name
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
        {
            let (element, len) =
                inner
                    .rsplit_once(';')
                    .ok_or_else(|| LayoutError::UnknownType {
                        type_name: type_name.to_string(),
                    })?;
            let len = len
                .trim()
                .parse::<usize>()
                .map_err(|_| LayoutError::UnknownType {
                    type_name: type_name.to_string(),
                })?;
            return Ok(FieldKind::Array {
                element: Box::new(self.resolve_kind(element)?),
                len,
            });
        }

        if let Some(layout) = self.get(type_name) {
            return Ok(FieldKind::Scalar(layout));
        }
        if let Some(schema) = self.record(type_name) {
            return Ok(FieldKind::Record(schema));
        }
        Err(LayoutError::UnknownType {
            type_name: type_name.to_string(),
        })
    }
}
