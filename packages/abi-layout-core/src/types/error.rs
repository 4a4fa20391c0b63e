/// Error type for type registration and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("Type '{type_id}' has invalid alignment: {align}")]
    InvalidAlignment { type_id: String, align: usize },

    #[error("Type '{type_id}' size {size} not divisible by alignment {align}")]
    SizeAlignmentMismatch {
        type_id: String,
        size: usize,
        align: usize,
    },

    #[error("Type '{type_id}' already registered")]
    AlreadyRegistered { type_id: String },

    #[error("Type '{type_id}' cannot encode a {got} value")]
    ValueMismatch { type_id: String, got: &'static str },

    #[error("Type validation failed: {message}")]
    ValidationFailed { type_id: String, message: String },
}
