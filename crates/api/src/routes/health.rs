//! Liveness endpoint.

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "parcel",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Creates the health route. It sits outside widget identity resolution.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
