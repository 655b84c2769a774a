//! Settings persistence seam.

use std::future::Future;

use chrono::{DateTime, Utc};
use parcel_shared::WidgetIdentity;

use super::error::SettingsError;
use super::types::{SettingsUpdate, WidgetSettings};

/// Settings persistence, scoped by widget identity.
pub trait SettingsStore: Send + Sync {
    /// Stored settings, if the widget has any.
    fn widget_settings(
        &self,
        widget: &WidgetIdentity,
    ) -> impl Future<Output = Result<Option<WidgetSettings>, SettingsError>> + Send;

    /// Insert or replace the email and display settings. The provider is
    /// left untouched.
    fn save_widget_settings(
        &self,
        widget: &WidgetIdentity,
        update: SettingsUpdate,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), SettingsError>> + Send;
}
