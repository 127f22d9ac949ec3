//! Error types for the config crate.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for config operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or retargeting config documents.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read a config document from disk.
    #[error("failed to read config {path:?}: {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    /// A config document does not have the expected shape.
    #[error("malformed config '{document}': {reason}")]
    MalformedConfig { document: String, reason: String },

    /// Target hostname failed validation.
    #[error("invalid target host: {reason}")]
    InvalidTarget { reason: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed config error.
    pub fn malformed_config(document: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedConfig {
            document: document.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid target error.
    pub fn invalid_target(reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            reason: reason.into(),
        }
    }
}
