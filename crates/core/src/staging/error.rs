//! Staging error types.

use thiserror::Error;

/// Staging area operation errors.
#[derive(Debug, Error)]
pub enum StagingError {
    /// Staged object not found.
    #[error("staged file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Backend configuration error.
    #[error("staging configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("staging operation failed: {0}")]
    Operation(String),
}

impl StagingError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StagingError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            _ => Self::Operation(err.to_string()),
        }
    }
}
