//! `SeaORM` entity definitions.

pub mod session_files;
pub mod upload_sessions;
pub mod widget_settings;
pub mod widget_tokens;
