//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a record document.
#[derive(Error, Debug)]
pub enum CodecError {
    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not a JSON object.
    #[error("document root is not a JSON object")]
    NotAnObject,

    /// The document has no usable `__key__` field.
    #[error("document is missing a string `__key__` field")]
    MissingKey,

    /// A reserved field is present but has the wrong shape.
    #[error("reserved field `{field}` has the wrong shape: {message}")]
    InvalidReservedField {
        /// Name of the reserved field.
        field: String,
        /// Description of the problem.
        message: String,
    },
}

impl CodecError {
    /// Creates an invalid reserved field error.
    pub fn invalid_reserved_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidReservedField {
            field: field.into(),
            message: message.into(),
        }
    }
}
