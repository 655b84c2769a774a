//! Opening upload sessions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parcel_shared::WidgetIdentity;
use tracing::{info, warn};

use super::error::UploadError;
use super::store::{CredentialStore, SessionStore};
use super::types::{NewSession, OpenedSession, UploadLimits};
use crate::provider::CapacityOracle;

/// Opens sessions bounded by the local ceiling and the remote quota.
pub struct SessionManager<R, O> {
    repo: Arc<R>,
    oracle: Arc<O>,
    limits: UploadLimits,
}

impl<R, O> SessionManager<R, O>
where
    R: SessionStore + CredentialStore,
    O: CapacityOracle,
{
    /// Create a new session manager.
    #[must_use]
    pub fn new(repo: Arc<R>, oracle: Arc<O>, limits: UploadLimits) -> Self {
        Self {
            repo,
            oracle,
            limits,
        }
    }

    /// Open a session for a widget.
    ///
    /// The returned limit is `min(max_file_size, remote capacity)`. When the
    /// provider cannot be asked, the local ceiling is used instead.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` if the widget has no credential,
    /// `QuotaExceeded` if the provider reports no space left, or a
    /// repository error.
    pub async fn open_session(
        &self,
        widget: &WidgetIdentity,
    ) -> Result<OpenedSession, UploadError> {
        let credential = self
            .repo
            .credential(widget)
            .await?
            .ok_or(UploadError::NotAuthenticated)?;

        let upload_size_limit = match self.oracle.available_capacity(&credential).await {
            Ok(0) => return Err(UploadError::QuotaExceeded { available: 0 }),
            Ok(capacity) => capacity.min(self.limits.max_file_size),
            Err(e) => {
                warn!(
                    instance_id = %widget.instance_id,
                    error = %e,
                    "Capacity lookup failed, using local limit"
                );
                self.limits.max_file_size
            }
        };

        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(self.limits.session_ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let session = self
            .repo
            .create_session(NewSession {
                widget: widget.clone(),
                upload_size_limit,
                created_at: now,
                expires_at,
            })
            .await?;

        info!(
            session_id = %session.id,
            instance_id = %widget.instance_id,
            upload_size_limit,
            "Upload session opened"
        );

        Ok(OpenedSession {
            session_id: session.id,
            upload_size_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::provider::ProviderError;
    use crate::testing::{MemoryStore, ScriptedOracle};
    use crate::upload::SessionState;

    fn limits(max: u64) -> UploadLimits {
        UploadLimits {
            max_file_size: max,
            session_ttl: Duration::from_secs(3600),
        }
    }

    fn widget() -> WidgetIdentity {
        WidgetIdentity::new("inst", "comp")
    }

    #[tokio::test]
    async fn test_open_uses_smaller_of_capacity_and_local_max() {
        let store = Arc::new(MemoryStore::with_credential(&widget()));
        let oracle = Arc::new(ScriptedOracle::new([Ok(500_000)]));
        let manager = SessionManager::new(Arc::clone(&store), oracle, limits(1_000_000));

        let opened = manager.open_session(&widget()).await.unwrap();
        assert_eq!(opened.upload_size_limit, 500_000);

        let session = store.session(opened.session_id).unwrap();
        assert_eq!(session.state, SessionState::Open);
        assert_eq!(session.accumulated_size, 0);
        assert!(session.expires_at > session.created_at);
    }

    #[tokio::test]
    async fn test_open_caps_at_local_max() {
        let store = Arc::new(MemoryStore::with_credential(&widget()));
        let oracle = Arc::new(ScriptedOracle::new([Ok(u64::MAX)]));
        let manager = SessionManager::new(store, oracle, limits(1_000_000));

        let opened = manager.open_session(&widget()).await.unwrap();
        assert_eq!(opened.upload_size_limit, 1_000_000);
    }

    #[tokio::test]
    async fn test_open_falls_back_when_oracle_fails() {
        let store = Arc::new(MemoryStore::with_credential(&widget()));
        let oracle = Arc::new(ScriptedOracle::new([Err(ProviderError::unavailable(
            "timeout",
        ))]));
        let manager = SessionManager::new(store, oracle, limits(1_000_000));

        let opened = manager.open_session(&widget()).await.unwrap();
        assert_eq!(opened.upload_size_limit, 1_000_000);
    }

    #[tokio::test]
    async fn test_open_rejects_full_drive() {
        let store = Arc::new(MemoryStore::with_credential(&widget()));
        let oracle = Arc::new(ScriptedOracle::new([Ok(0)]));
        let manager = SessionManager::new(Arc::clone(&store), oracle, limits(1_000_000));

        let err = manager.open_session(&widget()).await.unwrap_err();
        assert!(matches!(err, UploadError::QuotaExceeded { available: 0 }));
        assert_eq!(store.session_count(), 0);
    }

    #[tokio::test]
    async fn test_open_requires_credential() {
        let store = Arc::new(MemoryStore::default());
        let oracle = Arc::new(ScriptedOracle::new([Ok(500_000)]));
        let manager =
            SessionManager::new(Arc::clone(&store), Arc::clone(&oracle), limits(1_000_000));

        let err = manager.open_session(&widget()).await.unwrap_err();
        assert!(matches!(err, UploadError::NotAuthenticated));
        assert_eq!(oracle.calls(), 0);
        assert_eq!(store.session_count(), 0);
    }
}
