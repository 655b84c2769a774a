//! Upload session domain types.

use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use parcel_shared::{FileId, SessionId, UploadConfig, WidgetIdentity};
use serde::{Deserialize, Serialize};

use super::error::UploadError;
use crate::delivery::DeliveryTicket;

/// Session lifecycle state.
///
/// `Open` is the only state that accepts registrations or a commit; both
/// `Committed` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Accepting files.
    Open,
    /// Finalised by a successful commit.
    Committed,
    /// Timed out before commit.
    Expired,
}

impl SessionState {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Committed => "committed",
            Self::Expired => "expired",
        }
    }

    /// Parse the database representation.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "open" => Some(Self::Open),
            "committed" => Some(Self::Committed),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted upload session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Session ID.
    pub id: SessionId,
    /// Widget that opened the session.
    pub widget: WidgetIdentity,
    /// Current state.
    pub state: SessionState,
    /// Ceiling fixed at open time.
    pub upload_size_limit: u64,
    /// Sum of registered file sizes.
    pub accumulated_size: u64,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
    /// When the session stops accepting work.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Remaining room before the ceiling is reached.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.upload_size_limit.saturating_sub(self.accumulated_size)
    }

    /// Ensure the session still accepts work at `now`.
    ///
    /// A session past its deadline counts as expired even if the reaper has
    /// not reached it yet.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyCommitted` or `SessionExpired`.
    pub fn ensure_open(&self, now: DateTime<Utc>) -> Result<(), UploadError> {
        match self.state {
            SessionState::Committed => Err(UploadError::AlreadyCommitted(self.id)),
            SessionState::Expired => Err(UploadError::SessionExpired(self.id)),
            SessionState::Open if now >= self.expires_at => {
                Err(UploadError::SessionExpired(self.id))
            }
            SessionState::Open => Ok(()),
        }
    }

    /// Decide whether a file of `size` bytes may join the session.
    ///
    /// # Errors
    ///
    /// Returns a state error, or `FileTooLarge` when the file alone reaches
    /// the ceiling or would push the accumulated size past it.
    pub fn check_admission(&self, size: u64, now: DateTime<Utc>) -> Result<(), UploadError> {
        self.ensure_open(now)?;

        if size >= self.upload_size_limit {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.upload_size_limit,
            });
        }

        let remaining = self.remaining();
        if size > remaining {
            return Err(UploadError::FileTooLarge {
                size,
                max: remaining,
            });
        }

        Ok(())
    }
}

/// Input for creating a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Owning widget.
    pub widget: WidgetIdentity,
    /// Ceiling for the session.
    pub upload_size_limit: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Deadline.
    pub expires_at: DateTime<Utc>,
}

/// A file recorded against a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    /// File ID.
    pub id: FileId,
    /// Owning session.
    pub session_id: SessionId,
    /// Original filename.
    pub filename: String,
    /// MIME type reported by the client.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Key of the staged bytes.
    pub storage_ref: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for recording a file.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Owning session.
    pub session_id: SessionId,
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Key of the staged bytes.
    pub storage_ref: String,
}

/// A file as received from the client, before validation.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    /// Received bytes.
    pub bytes: Bytes,
    /// Size the client declared, unparsed.
    pub declared_size: String,
    /// MIME type.
    pub mime_type: String,
    /// Original filename.
    pub filename: String,
}

/// Local limits applied to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    /// Local ceiling for one file and for a commit total.
    pub max_file_size: u64,
    /// Session lifetime.
    pub session_ttl: Duration,
}

impl From<&UploadConfig> for UploadLimits {
    fn from(config: &UploadConfig) -> Self {
        Self {
            max_file_size: config.max_file_size,
            session_ttl: Duration::from_secs(config.session_ttl_secs),
        }
    }
}

/// Result of opening a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenedSession {
    /// New session ID.
    pub session_id: SessionId,
    /// Binding ceiling for the session.
    pub upload_size_limit: u64,
}

/// Result of a successful commit.
///
/// The ticket must be dispatched once the response has been sent; dropping
/// it dispatches as well.
#[derive(Debug)]
pub struct Accepted {
    /// Committed session.
    pub session_id: SessionId,
    /// Number of files in the bundle.
    pub file_count: usize,
    /// Total bytes in the bundle.
    pub total_size: u64,
    /// Pending delivery.
    pub ticket: DeliveryTicket,
}
