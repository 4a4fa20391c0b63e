//! Layout engine configuration.

/// Layout engine configuration.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Maximum full record size in bytes (default: unlimited)
    pub max_record_size: usize,
    /// Maximum nesting depth of record-in-record fields
    pub max_nesting_depth: usize,
    /// Register the reference kernel structures with new registries
    pub register_abi_records: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            max_record_size: usize::MAX,
            max_nesting_depth: 32,
            register_abi_records: true,
        }
    }
}
