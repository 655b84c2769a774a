//! Settings error types.

use parcel_shared::AppError;
use thiserror::Error;

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Malformed settings payload.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl SettingsError {
    /// Create an invalid format error.
    #[must_use]
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Machine-readable kind reported to clients.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid-format",
            Self::Repository(_) => "repository-error",
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(err: SettingsError) -> Self {
        let message = err.to_string();
        match err {
            SettingsError::InvalidFormat(_) => Self::Validation(message),
            SettingsError::Repository(_) => Self::Database(message),
        }
    }
}
