//! Error types for config tree operations

use std::path::PathBuf;
use thiserror::Error;

use crate::kind::ValueKind;

/// Result type for config tree operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while building, querying, loading or saving a config tree
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Coercion or assignment against an item's declared kind
    #[error("Type mismatch for {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// JSON shape disagrees with the expected structure
    #[error("Malformed config at {location}: {message}")]
    MalformedConfig { location: String, message: String },

    /// Group lookup or removal miss
    #[error("Item '{key}' not found")]
    KeyNotFound { key: String },

    /// Group key containing the path separator
    #[error("Key '{key}' contains '.', which separates path segments")]
    InvalidKey { key: String },

    /// Group insert collision
    #[error("Item '{key}' already exists")]
    DuplicateKey { key: String },

    /// List positional access miss
    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// File read/write failure
    #[error("I/O error for {path}: {message}")]
    IoError { path: PathBuf, message: String },

    /// Save attempted with no configured path
    #[error("No backing file configured")]
    NoBackingFile,

    /// Float with no JSON representation
    #[error("Number {0} cannot be represented in JSON")]
    NonFiniteNumber(f64),
}

impl ConfigError {
    /// Get the error code for CLI/API responses
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } | Self::NonFiniteNumber(_) => "TYPE_MISMATCH",
            Self::MalformedConfig { .. } => "MALFORMED_CONFIG",
            Self::KeyNotFound { .. } => "KEY_NOT_FOUND",
            Self::InvalidKey { .. } => "INVALID_KEY",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::IndexOutOfRange { .. } => "INDEX_OUT_OF_RANGE",
            Self::IoError { .. } => "IO_ERROR",
            Self::NoBackingFile => "NO_BACKING_FILE",
        }
    }

    pub(crate) fn type_mismatch(
        context: impl Into<String>,
        expected: ValueKind,
        found: ValueKind,
    ) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            expected,
            found,
        }
    }

    pub(crate) fn malformed(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedConfig {
            location: location.into(),
            message: message.into(),
        }
    }

    pub(crate) fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedConfig {
            location: format!("line {} column {}", err.line(), err.column()),
            message: err.to_string(),
        }
    }
}
