//! Commit payload parsing and visitor validation.

use parcel_shared::{FileId, SessionId};
use serde::Deserialize;
use serde_json::Value;
use validator::ValidateEmail;

use super::error::UploadError;

/// The visitor who submitted a bundle.
///
/// Only constructed from fully validated input and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    first_name: String,
    last_name: String,
    email: String,
    message: String,
    session_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawName {
    #[serde(default)]
    first: Option<String>,
    #[serde(default)]
    last: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVisitor {
    visitor_email: Option<String>,
    visitor_name: Option<RawName>,
    visitor_message: Option<String>,
    #[serde(alias = "wixSessionToken")]
    session_token: Option<String>,
}

impl Visitor {
    /// Build a visitor from a commit payload object.
    ///
    /// All fields are trimmed. The email must be syntactically valid, at
    /// least one name part must be present, and both the message and the
    /// embedding session token must be non-empty.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if any field is missing or invalid.
    pub fn from_payload(payload: &Value) -> Result<Self, UploadError> {
        let raw = RawVisitor::deserialize(payload)
            .map_err(|e| UploadError::invalid_format(format!("visitor fields: {e}")))?;

        let missing = || UploadError::invalid_format("missing visitor fields");

        let email = raw.visitor_email.ok_or_else(missing)?.trim().to_string();
        let name = raw.visitor_name.ok_or_else(missing)?;
        let message = raw.visitor_message.ok_or_else(missing)?.trim().to_string();
        let session_token = raw.session_token.ok_or_else(missing)?.trim().to_string();

        let first_name = name.first.unwrap_or_default().trim().to_string();
        let last_name = name.last.unwrap_or_default().trim().to_string();

        if email.is_empty() || !email.validate_email() {
            return Err(UploadError::invalid_format("invalid visitor email"));
        }
        if first_name.is_empty() && last_name.is_empty() {
            return Err(UploadError::invalid_format("visitor name is empty"));
        }
        if message.is_empty() {
            return Err(UploadError::invalid_format("visitor message is empty"));
        }
        if session_token.is_empty() {
            return Err(UploadError::invalid_format("session token is empty"));
        }

        Ok(Self {
            first_name,
            last_name,
            email,
            message,
            session_token,
        })
    }

    /// First name, possibly empty.
    #[must_use]
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    /// Last name, possibly empty.
    #[must_use]
    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    /// Email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Free-text message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Opaque token from the embedding page.
    #[must_use]
    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// "First Last", or whichever part is present.
    #[must_use]
    pub fn display_name(&self) -> String {
        match (self.first_name.is_empty(), self.last_name.is_empty()) {
            (false, false) => format!("{} {}", self.first_name, self.last_name),
            (false, true) => self.first_name.clone(),
            _ => self.last_name.clone(),
        }
    }
}

/// A structurally valid commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Target session.
    pub session_id: SessionId,
    /// Selected files, deduplicated in request order.
    pub file_ids: Vec<FileId>,
    /// Submitting visitor.
    pub visitor: Visitor,
}

impl CommitRequest {
    /// Parse the session id and the raw JSON body of a commit.
    ///
    /// Nothing here touches a store, so a malformed request is rejected
    /// before any state is read.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` for a non-numeric session id, a body that is
    /// not a JSON object, a missing or empty `fileIds` array, or an invalid
    /// visitor.
    pub fn parse(raw_session_id: &str, body: &[u8]) -> Result<Self, UploadError> {
        let session_id: SessionId = raw_session_id.parse()?;

        let payload: Value = serde_json::from_slice(body)
            .map_err(|_| UploadError::invalid_format("request body is not JSON"))?;
        if !payload.is_object() {
            return Err(UploadError::invalid_format("request body is not a JSON object"));
        }

        let file_ids = parse_file_ids(payload.get("fileIds"))?;
        let visitor = Visitor::from_payload(&payload)?;

        Ok(Self {
            session_id,
            file_ids,
            visitor,
        })
    }
}

fn parse_file_ids(value: Option<&Value>) -> Result<Vec<FileId>, UploadError> {
    let Some(Value::Array(items)) = value else {
        return Err(UploadError::invalid_format("fileIds must be an array"));
    };
    if items.is_empty() {
        return Err(UploadError::invalid_format("fileIds is empty"));
    }

    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let id = match item {
            Value::String(s) => s.parse::<FileId>()?,
            Value::Number(n) => n
                .as_i64()
                .filter(|v| *v > 0)
                .map(FileId::from_raw)
                .ok_or_else(|| UploadError::invalid_format(format!("invalid file id: {n}")))?,
            other => {
                return Err(UploadError::invalid_format(format!(
                    "invalid file id: {other}"
                )));
            }
        };
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
