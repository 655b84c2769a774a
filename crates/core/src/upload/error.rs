//! Upload protocol error types.

use parcel_shared::{AppError, FileId, ParseIdError, SessionId};
use thiserror::Error;

use crate::staging::StagingError;

/// Upload protocol errors.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Malformed identifier, size, payload, or visitor data.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// The widget has no usable provider credential.
    #[error("widget is not authenticated with the storage provider")]
    NotAuthenticated,

    /// Session does not exist for this widget.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// Session passed its deadline or was reaped.
    #[error("session expired: {0}")]
    SessionExpired(SessionId),

    /// Session was already committed.
    #[error("session already committed: {0}")]
    AlreadyCommitted(SessionId),

    /// File does not fit in the session.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Declared file size.
        size: u64,
        /// Room that was available.
        max: u64,
    },

    /// Commit total exceeds the local ceiling.
    #[error("payload too large: {total} bytes exceeds maximum {max} bytes")]
    PayloadTooLarge {
        /// Sum of selected file sizes.
        total: u64,
        /// Local ceiling.
        max: u64,
    },

    /// Remote storage cannot take the upload.
    #[error("storage quota exceeded: {available} bytes available")]
    QuotaExceeded {
        /// Remaining remote capacity.
        available: u64,
    },

    /// Some selected files do not belong to the session.
    #[error("files not found: {0:?}")]
    FilesNotFound(Vec<FileId>),

    /// The storage provider could not be reached.
    #[error("storage provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Staging area failure.
    #[error("staging error: {0}")]
    Staging(#[from] StagingError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl UploadError {
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
            Self::NotAuthenticated => "not-authenticated",
            Self::SessionNotFound(_) => "session-not-found",
            Self::SessionExpired(_) => "session-expired",
            Self::AlreadyCommitted(_) => "already-committed",
            Self::FileTooLarge { .. } => "file-too-large",
            Self::PayloadTooLarge { .. } => "payload-too-large",
            Self::QuotaExceeded { .. } => "quota-exceeded",
            Self::FilesNotFound(_) => "files-not-found",
            Self::ProviderUnavailable(_) => "provider-unavailable",
            Self::Staging(_) => "storage-error",
            Self::Repository(_) => "repository-error",
        }
    }
}

impl From<ParseIdError> for UploadError {
    fn from(err: ParseIdError) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        let message = err.to_string();
        match err {
            UploadError::InvalidFormat(_) => Self::Validation(message),
            UploadError::NotAuthenticated => Self::Unauthorized(message),
            UploadError::SessionNotFound(_) | UploadError::FilesNotFound(_) => {
                Self::NotFound(message)
            }
            UploadError::SessionExpired(_) => Self::Gone(message),
            UploadError::AlreadyCommitted(_) => Self::Conflict(message),
            UploadError::FileTooLarge { .. }
            | UploadError::PayloadTooLarge { .. }
            | UploadError::QuotaExceeded { .. } => Self::PayloadTooLarge(message),
            UploadError::ProviderUnavailable(_) => Self::ExternalService(message),
            UploadError::Staging(_) => Self::Internal(message),
            UploadError::Repository(_) => Self::Database(message),
        }
    }
}
