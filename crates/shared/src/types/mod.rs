//! Common types used across the application.

pub mod id;
pub mod widget;

pub use id::{FileId, ParseIdError, SessionId, parse_positive};
pub use widget::WidgetIdentity;
