//! Committing a session for delivery.

use std::sync::Arc;

use chrono::Utc;
use parcel_shared::{FileId, WidgetIdentity};
use tracing::info;

use super::error::UploadError;
use super::store::{CredentialStore, FileStore, SessionStore};
use super::types::{Accepted, UploadLimits};
use super::visitor::CommitRequest;
use crate::delivery::{DeliveryJob, DeliveryQueue};
use crate::provider::{CapacityOracle, ProviderError};

/// Validates a commit, closes the session, and hands back a delivery ticket.
pub struct CommitOrchestrator<R, O> {
    repo: Arc<R>,
    oracle: Arc<O>,
    queue: DeliveryQueue,
    limits: UploadLimits,
}

impl<R, O> CommitOrchestrator<R, O>
where
    R: SessionStore + FileStore + CredentialStore,
    O: CapacityOracle,
{
    /// Create a new commit orchestrator.
    #[must_use]
    pub fn new(repo: Arc<R>, oracle: Arc<O>, queue: DeliveryQueue, limits: UploadLimits) -> Self {
        Self {
            repo,
            oracle,
            queue,
            limits,
        }
    }

    /// Commit a session.
    ///
    /// Steps run strictly in order: structural validation, credential lookup,
    /// session state, file resolution, local size check, fresh capacity
    /// check, and finally the `Open -> Committed` transition. Nothing is delivered here; the
    /// returned ticket enqueues the bundle when dispatched.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error. Only the last step mutates
    /// state.
    pub async fn commit(
        &self,
        widget: &WidgetIdentity,
        raw_session_id: &str,
        payload: &[u8],
    ) -> Result<Accepted, UploadError> {
        let request = CommitRequest::parse(raw_session_id, payload)?;
        let session_id = request.session_id;

        let credential = self
            .repo
            .credential(widget)
            .await?
            .ok_or(UploadError::NotAuthenticated)?;

        // The reaper deletes files of expired sessions, so state is checked
        // before resolution. `close_session` still guards the race.
        self.repo
            .find_session(widget, session_id)
            .await?
            .ok_or(UploadError::SessionNotFound(session_id))?
            .ensure_open(Utc::now())?;

        let files = self
            .repo
            .files_by_ids(widget, session_id, &request.file_ids)
            .await?;

        let missing: Vec<FileId> = request
            .file_ids
            .iter()
            .filter(|id| !files.iter().any(|f| f.id == **id))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(UploadError::FilesNotFound(missing));
        }

        let total_size = files.iter().fold(0u64, |acc, f| acc.saturating_add(f.size));
        if total_size > self.limits.max_file_size {
            return Err(UploadError::PayloadTooLarge {
                total: total_size,
                max: self.limits.max_file_size,
            });
        }

        let available = self
            .oracle
            .available_capacity(&credential)
            .await
            .map_err(|e| match e {
                ProviderError::CredentialInvalid => UploadError::NotAuthenticated,
                other => UploadError::ProviderUnavailable(other.to_string()),
            })?;
        if available <= self.limits.max_file_size {
            return Err(UploadError::QuotaExceeded { available });
        }

        self.repo
            .close_session(widget, session_id, Utc::now())
            .await?;

        info!(
            session_id = %session_id,
            instance_id = %widget.instance_id,
            files = files.len(),
            total_size,
            "Session committed"
        );

        let file_count = files.len();
        let ticket = self.queue.ticket(DeliveryJob {
            widget: widget.clone(),
            session_id,
            visitor: request.visitor,
            credential,
            files,
        });

        Ok(Accepted {
            session_id,
            file_count,
            total_size,
            ticket,
        })
    }
}
