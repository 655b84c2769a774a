//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - The `/api/files` upload session routes
//! - The `/api/widget-settings` owner settings routes
//! - Widget identity middleware
//! - Error rendering
//! - A response body wrapper that dispatches deliveries

pub mod body;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use parcel_core::delivery::DeliveryQueue;
use parcel_core::settings::SettingsService;
use parcel_core::staging::StagingArea;
use parcel_core::upload::{CommitOrchestrator, FileRegistry, SessionManager, UploadLimits};
use parcel_db::{SettingsRepository, UploadRepository};
use parcel_drive::DriveClient;
use parcel_shared::InstanceVerifier;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Verifies widget instance tokens.
    pub verifier: Arc<InstanceVerifier>,
    /// Opens sessions.
    pub sessions: Arc<SessionManager<UploadRepository, DriveClient>>,
    /// Registers files.
    pub registry: Arc<FileRegistry<UploadRepository>>,
    /// Commits sessions.
    pub commits: Arc<CommitOrchestrator<UploadRepository, DriveClient>>,
    /// Reads and writes widget settings.
    pub settings: Arc<SettingsService<SettingsRepository>>,
    /// Local ceilings.
    pub limits: UploadLimits,
}

impl AppState {
    /// Wire the services over one connection and Drive client.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        verifier: InstanceVerifier,
        staging: Arc<StagingArea>,
        drive: Arc<DriveClient>,
        queue: DeliveryQueue,
        limits: UploadLimits,
    ) -> Self {
        let settings = Arc::new(SettingsService::new(Arc::new(SettingsRepository::new(
            db.clone(),
        ))));
        let repo = Arc::new(UploadRepository::new(db));

        Self {
            verifier: Arc::new(verifier),
            sessions: Arc::new(SessionManager::new(
                Arc::clone(&repo),
                Arc::clone(&drive),
                limits,
            )),
            registry: Arc::new(FileRegistry::new(Arc::clone(&repo), staging, limits)),
            commits: Arc::new(CommitOrchestrator::new(repo, drive, queue, limits)),
            settings,
            limits,
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api/files", routes::files::routes(&state))
        .merge(routes::settings::routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
