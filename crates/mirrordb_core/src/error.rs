//! Error types for MirrorDB core.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in MirrorDB store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Document codec error.
    #[error("codec error: {0}")]
    Codec(#[from] mirrordb_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A record with this key already exists.
    #[error("key already exists: {key}")]
    DuplicateKey {
        /// The rejected key.
        key: String,
    },

    /// No record with this key exists.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// The key that was looked up.
        key: String,
    },

    /// No key could be derived for a record.
    #[error("could not derive a key for the record")]
    KeyDerivation,

    /// A commit targeted a key this store does not own.
    #[error("record for key {key} is not managed by this store")]
    ForeignProxy {
        /// The key of the foreign record.
        key: String,
    },

    /// A field write named a field the record does not have.
    #[error("record has no field named {field}")]
    UnknownField {
        /// The unknown field name.
        field: String,
    },

    /// A field rejected the value written to it.
    #[error("field {field} rejected the value: {message}")]
    InvalidFieldValue {
        /// The field being written.
        field: String,
        /// Description of the rejection.
        message: String,
    },
}

impl StoreError {
    /// Creates a duplicate key error.
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::DuplicateKey { key: key.into() }
    }

    /// Creates a key not found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Creates a foreign proxy error.
    pub fn foreign_proxy(key: impl Into<String>) -> Self {
        Self::ForeignProxy { key: key.into() }
    }

    /// Creates an unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Creates an invalid field value error.
    pub fn invalid_field_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFieldValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Codec(err.into())
    }
}
