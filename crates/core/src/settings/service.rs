//! Reading and writing widget settings.

use std::sync::Arc;

use chrono::Utc;
use parcel_shared::WidgetIdentity;
use tracing::info;

use super::error::SettingsError;
use super::store::SettingsStore;
use super::types::{SettingsUpdate, WidgetSettings};

/// Settings service over a store.
pub struct SettingsService<R> {
    repo: Arc<R>,
}

impl<R: SettingsStore> SettingsService<R> {
    /// Create a new settings service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Settings of a widget, or the empty defaults if none were saved.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the lookup fails.
    pub async fn get(&self, widget: &WidgetIdentity) -> Result<WidgetSettings, SettingsError> {
        Ok(self.repo.widget_settings(widget).await?.unwrap_or_default())
    }

    /// Validate and store a settings body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` before touching the store, or a repository
    /// error if the write fails.
    pub async fn update(
        &self,
        widget: &WidgetIdentity,
        payload: &[u8],
    ) -> Result<(), SettingsError> {
        let update = SettingsUpdate::parse(payload)?;
        let keys = update.settings.len();

        self.repo
            .save_widget_settings(widget, update, Utc::now())
            .await?;

        info!(
            instance_id = %widget.instance_id,
            component_id = %widget.component_id,
            keys,
            "Widget settings saved"
        );
        Ok(())
    }
}
