//! Widget owner settings.
//!
//! Each widget stores the owner's notification email and a free-form JSON
//! object of display settings. The provider column is written by the sign-in
//! flow and is read-only here.

pub mod error;
pub mod service;
pub mod store;
pub mod types;

pub use error::SettingsError;
pub use service::SettingsService;
pub use store::SettingsStore;
pub use types::{SettingsUpdate, WidgetSettings};
