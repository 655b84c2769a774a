//! Widget owner settings routes.
//!
//! - `GET /api/widget-settings` returns the stored settings or empty defaults
//! - `PUT /api/widget-settings` replaces the email and display settings

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
};
use parcel_core::settings::WidgetSettings;
use serde::Serialize;

use crate::{
    AppState,
    error::ApiError,
    middleware::{Widget, widget_middleware},
};

/// Creates the settings routes behind widget identity resolution.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/widget-settings",
            get(get_settings).put(put_settings),
        )
        .layer(from_fn_with_state(state.clone(), widget_middleware))
}

/// Response carrying a widget's settings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    /// Stored or default settings.
    pub widget_settings: WidgetSettings,
    /// HTTP status, echoed for widget clients.
    pub status: u16,
}

/// Response for a saved settings body.
#[derive(Debug, Serialize)]
pub struct SavedResponse {
    /// HTTP status, echoed for widget clients.
    pub status: u16,
}

/// GET `/api/widget-settings`
async fn get_settings(
    State(state): State<AppState>,
    Widget(widget): Widget,
) -> Result<Json<SettingsResponse>, ApiError> {
    let widget_settings = state.settings.get(&widget).await?;

    Ok(Json(SettingsResponse {
        widget_settings,
        status: StatusCode::OK.as_u16(),
    }))
}

/// PUT `/api/widget-settings`
async fn put_settings(
    State(state): State<AppState>,
    Widget(widget): Widget,
    payload: Bytes,
) -> Result<Json<SavedResponse>, ApiError> {
    state.settings.update(&widget, &payload).await?;

    Ok(Json(SavedResponse {
        status: StatusCode::OK.as_u16(),
    }))
}
