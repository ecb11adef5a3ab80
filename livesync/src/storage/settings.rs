//! Settings file management

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::SyncError;
use crate::filesys::file::File;
use crate::http::logs::LogScope;
use crate::logs::LogLevel;
use crate::utils::CooldownOptions;

/// Settings file looked up when no `--config` is given
pub const DEFAULT_SETTINGS_FILE: &str = "livesync.json";

/// livesync settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Backend configuration
    #[serde(default)]
    pub backend: BackendSettings,

    /// Application whose deployments are followed
    #[serde(default)]
    pub application_id: String,

    /// Push transport configuration
    #[serde(default)]
    pub transport: TransportSettings,

    /// Log paging configuration
    #[serde(default)]
    pub logs: LogSettings,

    /// Local status server
    #[serde(default)]
    pub server: ServerSettings,
}

impl Settings {
    /// Read settings from `file`. A missing file yields the defaults.
    pub async fn load(file: &File) -> Result<Self, SyncError> {
        if !file.exists().await {
            info!("No settings file at {}, using defaults", file.path().display());
            return Ok(Self::default());
        }
        let settings = file.read_json().await.map_err(|e| {
            SyncError::ConfigError(format!("{}: {}", file.path().display(), e))
        })?;
        Ok(settings)
    }

    /// Fail early on settings the runtime cannot work with
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.application_id.trim().is_empty() {
            return Err(SyncError::ConfigError("application_id is required".to_string()));
        }
        if self.backend.base_url.trim().is_empty() {
            return Err(SyncError::ConfigError("backend.base_url is required".to_string()));
        }
        if self.logs.page_size == 0 {
            return Err(SyncError::ConfigError("logs.page_size must be positive".to_string()));
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Push transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Websocket path, relative to the backend URL
    #[serde(default = "default_transport_path")]
    pub path: String,

    #[serde(default = "default_reconnect_base")]
    pub reconnect_base_secs: u64,

    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_secs: u64,

    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,
}

fn default_transport_path() -> String {
    "ws".to_string()
}

fn default_reconnect_base() -> u64 {
    1
}

fn default_reconnect_max() -> u64 {
    60
}

fn default_heartbeat() -> u64 {
    30
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            path: default_transport_path(),
            reconnect_base_secs: default_reconnect_base(),
            reconnect_max_secs: default_reconnect_max(),
            heartbeat_secs: default_heartbeat(),
        }
    }
}

impl TransportSettings {
    pub fn reconnect(&self) -> CooldownOptions {
        CooldownOptions {
            base_delay: Duration::from_secs(self.reconnect_base_secs),
            max_delay: Duration::from_secs(self.reconnect_max_secs.max(self.reconnect_base_secs)),
            ..CooldownOptions::default()
        }
    }
}

/// Log paging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Which resource the initial log view follows
    #[serde(default)]
    pub scope: LogScope,

    /// Deployment to follow when `scope` is `deployment`
    #[serde(default)]
    pub deployment_id: Option<String>,

    #[serde(default = "default_true")]
    pub auto_scroll: bool,
}

fn default_page_size() -> u32 {
    50
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            scope: LogScope::default(),
            deployment_id: None,
            auto_scroll: true,
        }
    }
}

/// Local status server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8765
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}
