//! Signed widget instance tokens.
//!
//! The hosting page hands every widget request an HS256 token naming the
//! instance and component it was issued for. Verifying it is the only way a
//! request acquires a [`WidgetIdentity`]; there is no fallback identity.

use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::InstanceConfig;
use crate::types::WidgetIdentity;

/// Claims carried by a widget instance token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceClaims {
    /// Instance id of the embedding site.
    pub instance_id: String,
    /// Component id of the widget.
    pub comp_id: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl InstanceClaims {
    /// Creates claims for a widget.
    #[must_use]
    pub fn new(widget: &WidgetIdentity, expires_at: DateTime<Utc>) -> Self {
        Self {
            instance_id: widget.instance_id.clone(),
            comp_id: widget.component_id.clone(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the widget identity named by the claims.
    #[must_use]
    pub fn widget(&self) -> WidgetIdentity {
        WidgetIdentity::new(self.instance_id.clone(), self.comp_id.clone())
    }
}

/// Errors that can occur while handling instance tokens.
#[derive(Debug, Error)]
pub enum InstanceError {
    /// Token encoding failed.
    #[error("failed to encode instance token: {0}")]
    Encoding(String),

    /// Token has expired.
    #[error("instance token has expired")]
    Expired,

    /// Token is malformed, badly signed, or names an empty widget.
    #[error("invalid instance token: {0}")]
    Invalid(String),
}

/// Signs and verifies widget instance tokens.
#[derive(Clone)]
pub struct InstanceVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for InstanceVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceVerifier")
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl InstanceVerifier {
    /// Creates a verifier from configuration.
    #[must_use]
    pub fn new(config: &InstanceConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
        }
    }

    /// Issues a token for a widget. Used by the hosting side and in tests.
    ///
    /// # Errors
    ///
    /// Returns `InstanceError::Encoding` if signing fails.
    pub fn issue(
        &self,
        widget: &WidgetIdentity,
        expires_at: DateTime<Utc>,
    ) -> Result<String, InstanceError> {
        let claims = InstanceClaims::new(widget, expires_at);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| InstanceError::Encoding(e.to_string()))
    }

    /// Verifies a token and returns the widget it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `InstanceError::Expired` for expired tokens and
    /// `InstanceError::Invalid` for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<WidgetIdentity, InstanceError> {
        let claims = decode::<InstanceClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => InstanceError::Expired,
                _ => InstanceError::Invalid(e.to_string()),
            })?;

        if claims.instance_id.trim().is_empty() || claims.comp_id.trim().is_empty() {
            return Err(InstanceError::Invalid("empty widget identity".to_string()));
        }

        Ok(claims.widget())
    }
}
