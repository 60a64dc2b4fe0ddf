//! Error types for the flight-data crate.

use thiserror::Error;

/// Errors raised while decoding candidate records or reference values.
#[derive(Error, Debug)]
pub enum DataError {
    /// The payload was not valid JSON, or not the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A field had a value we cannot interpret
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// The top-level payload was not an array of records
    #[error("Expected an array of candidate records, found {found}")]
    NotAnArray { found: String },
}

/// Errors from the key-value persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error while reading or writing a record file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored envelope was written by an incompatible schema
    #[error("Unsupported schema version {found} for key {key}")]
    UnsupportedVersion { key: String, found: u32 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, DataError>;

/// Result alias for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
