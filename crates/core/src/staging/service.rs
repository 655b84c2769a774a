//! Staging area implementation using Apache OpenDAL.

use std::path::PathBuf;

use bytes::Bytes;
use opendal::{EntryMode, ErrorKind, Operator, services};
use parcel_shared::WidgetIdentity;
use tracing::{debug, error};
use uuid::Uuid;

use super::error::StagingError;

/// Backend holding staged bytes.
#[derive(Debug, Clone)]
pub enum StagingBackend {
    /// Local filesystem rooted at a directory.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// Process memory. Contents vanish on restart.
    Memory,
}

impl StagingBackend {
    /// Create a local filesystem backend.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the backend name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "local",
            Self::Memory => "memory",
        }
    }
}

/// Temporary byte storage for registered files.
pub struct StagingArea {
    operator: Operator,
    backend: StagingBackend,
}

impl std::fmt::Debug for StagingArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingArea")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl StagingArea {
    /// Create a staging area for the given backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized.
    pub fn from_backend(backend: StagingBackend) -> Result<Self, StagingError> {
        let operator = Self::create_operator(&backend)?;
        Ok(Self { operator, backend })
    }

    /// In-memory staging area.
    ///
    /// # Errors
    ///
    /// Returns an error if the operator cannot be built.
    pub fn in_memory() -> Result<Self, StagingError> {
        Self::from_backend(StagingBackend::Memory)
    }

    fn create_operator(backend: &StagingBackend) -> Result<Operator, StagingError> {
        match backend {
            StagingBackend::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StagingError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StagingError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StagingBackend::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StagingError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Generate a staging key for a new upload.
    #[must_use]
    pub fn generate_key(widget: &WidgetIdentity, upload_id: Uuid, filename: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            sanitize_segment(&widget.instance_id),
            sanitize_segment(&widget.component_id),
            upload_id,
            sanitize_segment(filename)
        )
    }

    /// Write bytes to the staging area and return their key.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn stage(
        &self,
        widget: &WidgetIdentity,
        filename: &str,
        content: Bytes,
    ) -> Result<String, StagingError> {
        let key = Self::generate_key(widget, Uuid::new_v4(), filename);
        self.operator
            .write(&key, content)
            .await
            .map(|_| ())
            .map_err(StagingError::from)?;

        debug!(key = %key, backend = self.backend.name(), "Staged upload");
        Ok(key)
    }

    /// Read staged bytes back.
    ///
    /// # Errors
    ///
    /// Returns an error if the key does not exist or cannot be read.
    pub async fn read(&self, key: &str) -> Result<Bytes, StagingError> {
        let buffer = self.operator.read(key).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StagingError::not_found(key)
            } else {
                StagingError::from(e)
            }
        })?;
        Ok(buffer.to_bytes())
    }

    /// Delete staged bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn release(&self, key: &str) -> Result<(), StagingError> {
        self.operator.delete(key).await.map_err(StagingError::from)
    }

    /// Delete staged bytes, logging instead of returning a failure.
    pub async fn release_best_effort(&self, key: &str) {
        if let Err(e) = self.release(key).await {
            error!(key = %key, error = %e, "Failed to release staged file");
        }
    }

    /// Check if a key exists in the staging area.
    pub async fn exists(&self, key: &str) -> bool {
        matches!(self.operator.stat(key).await, Ok(_))
    }

    /// List every staged key.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be listed.
    pub async fn list_keys(&self) -> Result<Vec<String>, StagingError> {
        let entries = self.operator.list_with("").recursive(true).await?;
        Ok(entries
            .into_iter()
            .filter(|entry| entry.metadata().mode() == EntryMode::FILE)
            .map(|entry| entry.path().to_string())
            .collect())
    }

    /// Get the backend description.
    #[must_use]
    pub fn backend(&self) -> &StagingBackend {
        &self.backend
    }
}

/// Sanitize one key segment.
///
/// Only ASCII alphanumeric characters, dots, hyphens, and underscores survive;
/// everything else becomes `_`. A segment made only of dots would walk out of
/// its directory, so it is replaced as well.
fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        cleaned
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
