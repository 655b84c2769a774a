//! Upload session routes.
//!
//! - `POST /session` opens a session bounded by the provider's capacity
//! - `POST /upload?sessionId=N` registers one multipart `file`
//! - `POST /commit?sessionId=N` commits a selection of files for delivery

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::post,
};
use parcel_core::upload::{IncomingFile, UploadError};
use parcel_shared::{FileId, SessionId};
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    body::DispatchOnEnd,
    error::ApiError,
    middleware::{Widget, widget_middleware},
};

/// Room for multipart boundaries and the `size` field on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates the upload routes, all behind widget identity resolution.
pub fn routes(state: &AppState) -> Router<AppState> {
    let body_limit = usize::try_from(state.limits.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/session", post(open_session))
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/commit", post(commit))
        .layer(from_fn_with_state(state.clone(), widget_middleware))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// `?sessionId=` query parameter, kept raw so malformed ids reach the
/// protocol's own validation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    /// Raw session id.
    #[serde(default)]
    pub session_id: Option<String>,
}

impl SessionQuery {
    fn raw(&self) -> &str {
        self.session_id.as_deref().unwrap_or_default()
    }
}

/// Response for an opened session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// New session id.
    pub session_id: SessionId,
    /// Binding byte ceiling for the session.
    pub upload_size_limit: u64,
    /// HTTP status, echoed for widget clients.
    pub status: u16,
}

/// Response for a registered file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// New file id.
    pub file_id: FileId,
    /// HTTP status, echoed for widget clients.
    pub status: u16,
}

/// Response for an accepted commit.
#[derive(Debug, Serialize)]
pub struct CommitResponse {
    /// HTTP status, echoed for widget clients.
    pub status: u16,
}

// ============================================================================
// Helper Functions
// ============================================================================

async fn read_upload(mut multipart: Multipart) -> Result<IncomingFile, ApiError> {
    let mut file = None;
    let mut declared_size = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                file = Some((filename, mime_type, bytes));
            }
            Some("size") => declared_size = Some(field.text().await?),
            _ => {}
        }
    }

    let Some((filename, mime_type, bytes)) = file else {
        return Err(UploadError::invalid_format("missing file field").into());
    };
    let declared_size = declared_size.unwrap_or_else(|| bytes.len().to_string());

    Ok(IncomingFile {
        bytes,
        declared_size,
        mime_type,
        filename,
    })
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/api/files/session`
async fn open_session(
    State(state): State<AppState>,
    Widget(widget): Widget,
) -> Result<Json<SessionResponse>, ApiError> {
    let opened = state.sessions.open_session(&widget).await?;

    Ok(Json(SessionResponse {
        session_id: opened.session_id,
        upload_size_limit: opened.upload_size_limit,
        status: StatusCode::OK.as_u16(),
    }))
}

/// POST `/api/files/upload?sessionId=N`
async fn upload_file(
    State(state): State<AppState>,
    Widget(widget): Widget,
    Query(query): Query<SessionQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let incoming = read_upload(multipart).await?;
    let file = state
        .registry
        .register_file(&widget, query.raw(), incoming)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(FileResponse {
            file_id: file.id,
            status: StatusCode::CREATED.as_u16(),
        }),
    ))
}

/// POST `/api/files/commit?sessionId=N`
///
/// The delivery ticket rides on the response body and is dispatched once the
/// `202` has been written.
async fn commit(
    State(state): State<AppState>,
    Widget(widget): Widget,
    Query(query): Query<SessionQuery>,
    payload: Bytes,
) -> Result<Response, ApiError> {
    let accepted = state.commits.commit(&widget, query.raw(), &payload).await?;

    let response = (
        StatusCode::ACCEPTED,
        Json(CommitResponse {
            status: StatusCode::ACCEPTED.as_u16(),
        }),
    )
        .into_response();
    let (parts, body) = response.into_parts();

    Ok(Response::from_parts(
        parts,
        Body::new(DispatchOnEnd::new(body, accepted.ticket)),
    ))
}
