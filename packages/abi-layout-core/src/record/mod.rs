//! Record layout engine: field declarations, schemas and record instances.

mod buffer;
mod field;
#[allow(clippy::module_inception)]
mod record;
mod schema;
pub(crate) mod validation;

pub use buffer::AlignedBuffer;
pub use field::{Field, FieldDef, FieldKind};
pub use record::{peek_field, poke_field, with_scoped_record, Record};
pub use schema::{FieldPath, Padding, RecordSchema, ResolvedField};
