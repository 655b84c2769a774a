//! Storage provider seams: remaining capacity and bundle delivery.
//!
//! The HTTP client for the real provider lives in its own crate; the core only
//! sees these traits.

use std::future::Future;

use thiserror::Error;

use crate::delivery::DeliveryBundle;
use crate::staging::StagingError;

/// Access credential for a widget's provider account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_token: String,
}

impl Credential {
    /// Wrap an access token.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Bearer token value.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"[hidden]")
            .finish()
    }
}

/// Provider call failures.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider rejected the credential.
    #[error("credential rejected by provider")]
    CredentialInvalid,

    /// The provider could not be reached or answered unexpectedly.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Staged bytes could not be read.
    #[error("staging error: {0}")]
    Staging(#[from] StagingError),
}

impl ProviderError {
    /// Create an unavailable error.
    #[must_use]
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Reports how many bytes the provider can still accept.
pub trait CapacityOracle: Send + Sync {
    /// Remaining capacity in bytes. `u64::MAX` means unlimited.
    fn available_capacity(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<u64, ProviderError>> + Send;
}

/// What a delivery produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Provider-side container the files went into, if any.
    pub folder_id: Option<String>,
    /// Provider-side ids of the delivered files, in bundle order.
    pub remote_ids: Vec<String>,
}

/// Transfers an accepted bundle to the provider.
pub trait DeliverySink: Send + Sync {
    /// Deliver every file in the bundle in one best-effort attempt.
    fn deliver(
        &self,
        bundle: &DeliveryBundle,
    ) -> impl Future<Output = Result<DeliveryReport, ProviderError>> + Send;
}
