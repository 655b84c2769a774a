//! Shared fixtures for route and body tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use parcel_core::delivery::{DeliveryBundle, DeliveryQueue};
use parcel_core::provider::{DeliveryReport, DeliverySink, ProviderError};
use parcel_core::staging::StagingArea;
use parcel_core::upload::{UploadLimits, Visitor};
use parcel_drive::DriveClient;
use parcel_shared::{DriveConfig, InstanceConfig, InstanceVerifier, WidgetIdentity};
use sea_orm::DatabaseConnection;
use serde_json::json;

use crate::AppState;

/// Sink that only counts deliveries.
#[derive(Debug, Default)]
pub struct CountingSink {
    delivered: AtomicUsize,
}

impl CountingSink {
    pub fn count(&self) -> usize {
        self.delivered.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` bundles were delivered.
    pub async fn wait_for(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.count() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("delivery did not happen in time");
    }
}

impl DeliverySink for CountingSink {
    async fn deliver(&self, _bundle: &DeliveryBundle) -> Result<DeliveryReport, ProviderError> {
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(DeliveryReport {
            folder_id: None,
            remote_ids: Vec::new(),
        })
    }
}

pub fn sample_visitor() -> Visitor {
    Visitor::from_payload(&json!({
        "visitorName": {"first": "Ada", "last": "Lovelace"},
        "visitorEmail": "ada@example.com",
        "visitorMessage": "Scans attached",
        "sessionToken": "opaque"
    }))
    .unwrap()
}

/// State over a disconnected database: anything reaching the store fails
/// with a repository error.
pub fn test_state() -> (AppState, InstanceVerifier) {
    let config = InstanceConfig {
        secret: "test-instance-secret".to_string(),
    };
    let staging = Arc::new(StagingArea::in_memory().unwrap());
    let drive = Arc::new(DriveClient::new(&DriveConfig::default()).unwrap());
    let (queue, _worker) =
        DeliveryQueue::start(Arc::new(CountingSink::default()), Arc::clone(&staging));
    let limits = UploadLimits {
        max_file_size: 1_000_000,
        session_ttl: Duration::from_secs(3600),
    };

    let state = AppState::new(
        DatabaseConnection::default(),
        InstanceVerifier::new(&config),
        staging,
        drive,
        queue,
        limits,
    );
    (state, InstanceVerifier::new(&config))
}

pub fn issue_token(verifier: &InstanceVerifier) -> String {
    verifier
        .issue(
            &WidgetIdentity::new("inst-1", "comp-1"),
            Utc::now() + chrono::Duration::hours(1),
        )
        .unwrap()
}
