//! Shared types, errors, and configuration for Parcel.
//!
//! This crate provides common types used across all other crates:
//! - Typed numeric IDs for sessions and files
//! - Widget identity and signed instance tokens
//! - Application-wide error classification
//! - Configuration management

pub mod config;
pub mod error;
pub mod instance;
pub mod types;

pub use config::{
    AppConfig, DatabaseConfig, DriveConfig, InstanceConfig, ServerConfig, StagingConfig,
    UploadConfig,
};
pub use error::{AppError, AppResult};
pub use instance::{InstanceClaims, InstanceError, InstanceVerifier};
pub use types::{FileId, ParseIdError, SessionId, WidgetIdentity};
