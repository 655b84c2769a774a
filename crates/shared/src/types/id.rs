//! Typed IDs for type-safe entity references.
//!
//! Sessions and files are keyed by database-assigned integers. Callers hand
//! them to us as strings, so parsing is strict: ASCII digits only, no sign,
//! no whitespace, and the value must fit in a positive `i64`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a caller-supplied identifier is not a valid number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} format: {raw:?}")]
pub struct ParseIdError {
    /// Which identifier failed to parse.
    pub kind: &'static str,
    /// The rejected input.
    pub raw: String,
}

/// Parses a strictly numeric, positive identifier.
///
/// # Errors
///
/// Returns `ParseIdError` if the input is empty, contains anything other
/// than ASCII digits, is zero, or overflows `i64`.
pub fn parse_positive(kind: &'static str, raw: &str) -> Result<i64, ParseIdError> {
    let invalid = || ParseIdError {
        kind,
        raw: raw.to_string(),
    };

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match raw.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(invalid()),
    }
}

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $kind:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates an ID from a raw database value.
            #[must_use]
            pub const fn from_raw(value: i64) -> Self {
                Self(value)
            }

            /// Returns the inner value.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_positive($kind, s).map(Self)
            }
        }
    };
}

typed_id!(SessionId, "session id", "Identifier of an upload session.");
typed_id!(FileId, "file id", "Identifier of a file registered in a session.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
