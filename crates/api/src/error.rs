//! JSON error responses.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parcel_core::settings::SettingsError;
use parcel_core::upload::UploadError;
use parcel_shared::{AppError, InstanceError};
use serde_json::json;
use tracing::{error, warn};

/// An error rendered as `{"error", "message", "status"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    /// Create an error response.
    #[must_use]
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.error
    }

    /// Render a classified error, hiding server fault details.
    fn classified(kind: &'static str, app: AppError) -> Self {
        let status = StatusCode::from_u16(app.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if app.is_server_fault() {
            error!(error = %app, code = app.error_code(), "Request failed");
            return Self::new(status, kind, "An internal error occurred");
        }

        Self::new(status, kind, app.to_string())
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        let kind = err.kind();
        Self::classified(kind, AppError::from(err))
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        let kind = err.kind();
        Self::classified(kind, AppError::from(err))
    }
}

impl From<InstanceError> for ApiError {
    fn from(err: InstanceError) -> Self {
        let message = match err {
            InstanceError::Expired => "Instance token has expired".to_string(),
            InstanceError::Invalid(_) | InstanceError::Encoding(_) => {
                "Invalid or malformed instance token".to_string()
            }
        };
        Self::new(StatusCode::UNAUTHORIZED, "not-authenticated", message)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        warn!(status = %status, error = %err.body_text(), "Rejected multipart body");
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, "file-too-large", "Request body is too large")
        } else {
            Self::new(StatusCode::BAD_REQUEST, "invalid-format", err.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "message": self.message,
            "status": self.status.as_u16(),
        });
        (self.status, Json(body)).into_response()
    }
}
