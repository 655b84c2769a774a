//! Widget identity middleware.

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parcel_core::upload::UploadError;
use parcel_shared::WidgetIdentity;
use serde::Deserialize;
use tracing::debug;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
struct InstanceQuery {
    instance: Option<String>,
}

fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

fn instance_token(request: &Request) -> Option<String> {
    let from_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_bearer_token)
        .map(str::to_string);

    from_header.or_else(|| {
        Query::<InstanceQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(q)| q.instance)
    })
}

/// Resolves the widget identity from a signed instance token.
///
/// The token comes from `Authorization: Bearer` or the `instance` query
/// parameter. Requests without a valid token never reach the handlers.
pub async fn widget_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(token) = instance_token(&request) else {
        return ApiError::from(UploadError::NotAuthenticated).into_response();
    };

    match state.verifier.verify(&token) {
        Ok(widget) => {
            debug!(
                instance_id = %widget.instance_id,
                component_id = %widget.component_id,
                "Widget resolved"
            );
            request.extensions_mut().insert(widget);
            next.run(request).await
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Extractor for the resolved widget identity.
#[derive(Debug, Clone)]
pub struct Widget(pub WidgetIdentity);

impl<S> FromRequestParts<S> for Widget
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<WidgetIdentity>()
            .cloned()
            .map(Widget)
            .ok_or_else(|| ApiError::from(UploadError::NotAuthenticated))
    }
}
