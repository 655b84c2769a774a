//! Parcel API Server
//!
//! Main entry point for the upload session service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parcel_api::{AppState, create_router};
use parcel_core::delivery::DeliveryQueue;
use parcel_core::staging::{StagingArea, StagingBackend};
use parcel_core::upload::{ExpiryReaper, UploadLimits};
use parcel_db::{UploadRepository, connect_with_pool};
use parcel_drive::DriveClient;
use parcel_shared::{AppConfig, InstanceVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parcel=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    let staging = Arc::new(StagingArea::from_backend(StagingBackend::local_fs(
        &config.staging.root,
    ))?);
    info!(
        root = %config.staging.root,
        backend = staging.backend().name(),
        "Staging area ready"
    );

    let drive = Arc::new(DriveClient::new(&config.drive)?);
    let (queue, _delivery) = DeliveryQueue::start(Arc::clone(&drive), Arc::clone(&staging));

    let limits = UploadLimits::from(&config.upload);
    info!(
        max_file_size = limits.max_file_size,
        session_ttl_secs = config.upload.session_ttl_secs,
        "Upload limits configured"
    );

    let reaper = ExpiryReaper::new(
        Arc::new(UploadRepository::new(db.clone())),
        Arc::clone(&staging),
    );
    let sweep_every = Duration::from_secs(config.upload.reaper_interval_secs.max(1));
    let _reaper = reaper.spawn(sweep_every);

    let state = AppState::new(
        db,
        InstanceVerifier::new(&config.instance),
        staging,
        drive,
        queue,
        limits,
    );
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
