//! Periodic expiry of abandoned sessions.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::error::UploadError;
use super::store::{FileStore, SessionStore};
use crate::staging::StagingArea;

/// Expires stale sessions and frees their staged bytes.
pub struct ExpiryReaper<R> {
    repo: Arc<R>,
    staging: Arc<StagingArea>,
}

impl<R> ExpiryReaper<R>
where
    R: SessionStore + FileStore + 'static,
{
    /// Create a new reaper.
    #[must_use]
    pub fn new(repo: Arc<R>, staging: Arc<StagingArea>) -> Self {
        Self { repo, staging }
    }

    /// Run one sweep. Returns the number of sessions expired.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the sweep cannot run.
    pub async fn sweep(&self) -> Result<usize, UploadError> {
        let expired = self.repo.expire_stale(Utc::now()).await?;
        if expired.is_empty() {
            return Ok(0);
        }

        let files = self.repo.remove_session_files(&expired).await?;
        for file in &files {
            self.staging.release_best_effort(&file.storage_ref).await;
        }

        info!(
            sessions = expired.len(),
            files = files.len(),
            "Expired stale upload sessions"
        );
        Ok(expired.len())
    }

    /// Sweep every `period` until the runtime shuts down.
    #[must_use]
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.sweep().await {
                    error!(error = %e, "Session sweep failed");
                }
            }
        })
    }
}
