//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Upload session limits.
    #[serde(default)]
    pub upload: UploadConfig,
    /// Staging area for uploaded bytes.
    #[serde(default)]
    pub staging: StagingConfig,
    /// Widget instance token configuration.
    pub instance: InstanceConfig,
    /// Storage provider (Google Drive) configuration.
    #[serde(default)]
    pub drive: DriveConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Upload session limits.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Local ceiling in bytes for a single file and for a whole commit.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
    /// How often stale sessions are swept, in seconds.
    #[serde(default = "default_reaper_interval")]
    pub reaper_interval_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            session_ttl_secs: default_session_ttl(),
            reaper_interval_secs: default_reaper_interval(),
        }
    }
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_session_ttl() -> u64 {
    3600 // 1 hour
}

fn default_reaper_interval() -> u64 {
    300 // 5 minutes
}

/// Staging area configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StagingConfig {
    /// Root directory for staged uploads.
    #[serde(default = "default_staging_root")]
    pub root: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            root: default_staging_root(),
        }
    }
}

fn default_staging_root() -> String {
    "./tmp".to_string()
}

/// Widget instance token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceConfig {
    /// Shared secret used to verify instance tokens.
    pub secret: String,
}

/// Google Drive API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DriveConfig {
    /// Base URL of the metadata API.
    #[serde(default = "default_drive_api_base")]
    pub api_base: String,
    /// Base URL of the media upload API.
    #[serde(default = "default_drive_upload_base")]
    pub upload_base: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_drive_timeout")]
    pub timeout_secs: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: default_drive_api_base(),
            upload_base: default_drive_upload_base(),
            timeout_secs: default_drive_timeout(),
        }
    }
}

fn default_drive_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_drive_upload_base() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

fn default_drive_timeout() -> u64 {
    60
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("PARCEL").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
