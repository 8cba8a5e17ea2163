//! Core error types for fundtracker-core.
//!
//! This module defines the error hierarchy using thiserror. Ledger errors
//! are user-facing (they end up in a notification), storage and config
//! errors are reported by the host.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fundtracker-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Ledger rejected an operation
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Errors raised by the ledger. None of them leave state changed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// Input was empty, not a number, not finite, or below one cent.
    #[error("Invalid amount: {input}")]
    InvalidAmount { input: String },

    /// Undo requested with no contributions recorded.
    #[error("Nothing to undo")]
    EmptyLedger,

    /// Target is not a positive amount within the representable range.
    #[error("Invalid target: {target}")]
    InvalidTarget { target: f64 },
}

impl LedgerError {
    pub(crate) fn invalid(input: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            input: input.into(),
        }
    }
}

/// Storage-specific errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    Database(#[from] rusqlite::Error),

    /// Persisted contributions could not be decoded.
    ///
    /// Recovered locally: the ledger starts empty.
    #[error("Corrupt persisted state: {0}")]
    CorruptPersistedState(String),

    /// Contributions could not be encoded for writing
    #[error("Failed to encode contributions: {0}")]
    Encode(#[from] serde_json::Error),

    /// Data directory unavailable
    #[error("Data directory unavailable: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key not present in the configuration
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyCollection(field) => ConfigError::InvalidValue {
                key: field,
                message: "must not be empty".into(),
            },
            ValidationError::InvalidValue { field, message } => {
                ConfigError::InvalidValue { key: field, message }
            }
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
