//! Settings types and payload validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::ValidateEmail;

use super::error::SettingsError;

/// Stored settings of one widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    /// Owner notification email. Empty when unset.
    pub user_email: String,
    /// Provider the owner signed in with. Empty when unset.
    pub provider: String,
    /// Free-form display settings, always a JSON object.
    pub settings: Map<String, Value>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            user_email: String::new(),
            provider: String::new(),
            settings: Map::new(),
        }
    }
}

/// A validated settings write.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsUpdate {
    /// Empty, or a syntactically valid email.
    pub user_email: String,
    /// Replacement display settings.
    pub settings: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBody {
    widget_settings: Option<RawSettings>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSettings {
    user_email: Option<String>,
    settings: Option<Value>,
}

impl SettingsUpdate {
    /// Parse a `{"widgetSettings": {"userEmail", "settings"}}` body.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the body is not JSON, the email is neither
    /// empty nor valid, or `settings` is not an object.
    pub fn parse(payload: &[u8]) -> Result<Self, SettingsError> {
        let body: RawBody = serde_json::from_slice(payload)
            .map_err(|e| SettingsError::invalid_format(format!("settings body: {e}")))?;
        let raw = body
            .widget_settings
            .ok_or_else(|| SettingsError::invalid_format("missing widgetSettings"))?;

        let user_email = raw
            .user_email
            .ok_or_else(|| SettingsError::invalid_format("missing userEmail"))?
            .trim()
            .to_string();
        if !user_email.is_empty() && !user_email.validate_email() {
            return Err(SettingsError::invalid_format("invalid userEmail"));
        }

        let Some(Value::Object(settings)) = raw.settings else {
            return Err(SettingsError::invalid_format("settings must be a JSON object"));
        };

        Ok(Self {
            user_email,
            settings,
        })
    }
}
