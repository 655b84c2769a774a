//! Registering uploaded files against a session.

use std::sync::Arc;

use chrono::Utc;
use parcel_shared::types::parse_positive;
use parcel_shared::{SessionId, WidgetIdentity};
use tracing::{debug, info, warn};

use super::error::UploadError;
use super::store::FileStore;
use super::types::{IncomingFile, NewFile, UploadFile, UploadLimits};
use crate::staging::StagingArea;

/// Validates uploaded files and records them against open sessions.
pub struct FileRegistry<R> {
    repo: Arc<R>,
    staging: Arc<StagingArea>,
    limits: UploadLimits,
}

impl<R: FileStore> FileRegistry<R> {
    /// Create a new file registry.
    #[must_use]
    pub fn new(repo: Arc<R>, staging: Arc<StagingArea>, limits: UploadLimits) -> Self {
        Self {
            repo,
            staging,
            limits,
        }
    }

    /// Validate a file, stage its bytes, and record it.
    ///
    /// Format checks run before any store access. The per-session checks run
    /// atomically inside the store. Staged bytes are released whenever no
    /// file record is created.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat`, `FileTooLarge`, `SessionNotFound`,
    /// `SessionExpired`, `AlreadyCommitted`, or an internal fault.
    pub async fn register_file(
        &self,
        widget: &WidgetIdentity,
        raw_session_id: &str,
        file: IncomingFile,
    ) -> Result<UploadFile, UploadError> {
        let session_id: SessionId = raw_session_id.parse()?;
        let size = parse_size(&file.declared_size)?;

        let received = file.bytes.len() as u64;
        if size != received {
            return Err(UploadError::invalid_format(format!(
                "declared size {size} does not match received {received} bytes"
            )));
        }

        if size >= self.limits.max_file_size {
            return Err(UploadError::FileTooLarge {
                size,
                max: self.limits.max_file_size,
            });
        }

        let storage_ref = self
            .staging
            .stage(widget, &file.filename, file.bytes)
            .await?;
        let guard = StagedGuard::new(Arc::clone(&self.staging), storage_ref.clone());

        let input = NewFile {
            session_id,
            filename: file.filename,
            mime_type: file.mime_type,
            size,
            storage_ref,
        };

        match self.repo.admit_file(widget, input, Utc::now()).await {
            Ok(record) => {
                guard.disarm();
                info!(
                    session_id = %session_id,
                    file_id = %record.id,
                    size,
                    "File registered"
                );
                Ok(record)
            }
            Err(e) => {
                debug!(
                    session_id = %session_id,
                    error = %e,
                    "File rejected, releasing staged bytes"
                );
                guard.release().await;
                Err(e)
            }
        }
    }
}

/// Owns a staged key until the file record exists.
///
/// Dropping an armed guard, for instance when the request future is
/// cancelled mid-admission, releases the bytes on a background task.
struct StagedGuard {
    staging: Arc<StagingArea>,
    key: Option<String>,
}

impl StagedGuard {
    fn new(staging: Arc<StagingArea>, key: String) -> Self {
        Self {
            staging,
            key: Some(key),
        }
    }

    fn disarm(mut self) {
        self.key = None;
    }

    async fn release(mut self) {
        if let Some(key) = &self.key {
            self.staging.release_best_effort(key).await;
        }
        self.key = None;
    }
}

impl Drop for StagedGuard {
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(key = %key, "No runtime left to release abandoned staged file");
            return;
        };

        let staging = Arc::clone(&self.staging);
        runtime.spawn(async move {
            debug!(key = %key, "Releasing bytes of abandoned registration");
            staging.release_best_effort(&key).await;
        });
    }
}

fn parse_size(raw: &str) -> Result<u64, UploadError> {
    parse_positive("file size", raw)
        .map_err(UploadError::from)
        .and_then(|v| u64::try_from(v).map_err(|_| UploadError::invalid_format("file size")))
}
