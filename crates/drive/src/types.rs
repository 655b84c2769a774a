//! Drive API payloads.

use serde::{Deserialize, Serialize};

/// MIME type Drive uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// Response of `GET /about?fields=storageQuota`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutResponse {
    /// Quota block.
    pub storage_quota: StorageQuota,
}

/// Storage quota as reported by Drive.
///
/// Drive encodes byte counts as decimal strings. `limit` is absent for
/// accounts without a quota.
#[derive(Debug, Default, Deserialize)]
pub struct StorageQuota {
    /// Total quota in bytes.
    #[serde(default)]
    pub limit: Option<String>,
    /// Bytes used across all services.
    #[serde(default)]
    pub usage: Option<String>,
}

impl StorageQuota {
    /// Remaining bytes, `u64::MAX` when unlimited.
    ///
    /// Returns `None` if a reported value is not a number.
    #[must_use]
    pub fn available(&self) -> Option<u64> {
        let Some(limit) = self.limit.as_deref() else {
            return Some(u64::MAX);
        };
        let limit: u64 = limit.parse().ok()?;
        let usage: u64 = match self.usage.as_deref() {
            Some(raw) => raw.parse().ok()?,
            None => 0,
        };
        Some(limit.saturating_sub(usage))
    }
}

/// Metadata body for creating or updating a file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata<'a> {
    /// Display name.
    pub name: &'a str,
    /// MIME type, only sent on create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<&'a str>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

/// Minimal file resource returned by Drive.
#[derive(Debug, Deserialize)]
pub struct FileResource {
    /// File id.
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn quota(limit: Option<&str>, usage: Option<&str>) -> StorageQuota {
        StorageQuota {
            limit: limit.map(String::from),
            usage: usage.map(String::from),
        }
    }

    #[rstest]
    #[case(Some("1000"), Some("250"), Some(750))]
    #[case(Some("1000"), None, Some(1000))]
    #[case(Some("1000"), Some("1500"), Some(0))]
    #[case(None, Some("1500"), Some(u64::MAX))]
    #[case(Some("lots"), Some("1"), None)]
    #[case(Some("1000"), Some("-1"), None)]
    fn test_available(
        #[case] limit: Option<&str>,
        #[case] usage: Option<&str>,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(quota(limit, usage).available(), expected);
    }

    #[test]
    fn test_about_response_parses_string_numbers() {
        let about: AboutResponse = serde_json::from_str(
            r#"{"storageQuota": {"limit": "16106127360", "usage": "106127360", "usageInDrive": "1"}}"#,
        )
        .unwrap();
        assert_eq!(about.storage_quota.available(), Some(16_000_000_000));
    }

    #[test]
    fn test_metadata_skips_absent_fields() {
        let body = serde_json::to_value(FileMetadata {
            name: "a.pdf",
            mime_type: None,
            description: Some("hello"),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"name": "a.pdf", "description": "hello"}));
    }
}
