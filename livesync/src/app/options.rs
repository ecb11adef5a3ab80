//! Application configuration options

use std::time::Duration;

use crate::http::logs::LogScope;
use crate::storage::settings::Settings;
use crate::sync::log_pager::DEFAULT_PAGE_SIZE;
use crate::utils::generate_uuid;
use crate::workers::subscriber;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Backend API base URL
    pub backend_base_url: String,

    /// Bearer token for the backend and the push transport
    pub api_token: Option<String>,

    /// HTTP request timeout
    pub request_timeout: Duration,

    /// Application whose deployments are followed
    pub application_id: String,

    /// Identifies this process to the push transport
    pub client_id: String,

    /// Capacity of the transport event channel
    pub event_buffer: usize,

    /// Subscriber worker options
    pub subscriber: subscriber::Options,

    /// Initial log view
    pub logs: LogViewOptions,

    /// Enable local HTTP server
    pub enable_server: bool,

    /// Server configuration
    pub server: ServerOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            backend_base_url: "http://localhost:8000/api/v1".to_string(),
            api_token: None,
            request_timeout: Duration::from_secs(30),
            application_id: String::new(),
            client_id: generate_uuid(),
            event_buffer: 256,
            subscriber: subscriber::Options::default(),
            logs: LogViewOptions::default(),
            enable_server: false,
            server: ServerOptions::default(),
        }
    }
}

impl AppOptions {
    /// Assemble options from a settings file
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            backend_base_url: settings.backend.base_url.clone(),
            api_token: settings.backend.api_token.clone(),
            request_timeout: settings.backend.request_timeout(),
            application_id: settings.application_id.clone(),
            subscriber: subscriber::Options {
                transport_path: settings.transport.path.clone(),
                reconnect: settings.transport.reconnect(),
                heartbeat_interval: Duration::from_secs(settings.transport.heartbeat_secs.max(1)),
            },
            logs: LogViewOptions {
                page_size: settings.logs.page_size,
                scope: settings.logs.scope,
                deployment_id: settings.logs.deployment_id.clone(),
                auto_scroll: settings.logs.auto_scroll,
            },
            enable_server: settings.server.enabled,
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            ..Default::default()
        }
    }
}

/// Lifecycle options
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(10),
        }
    }
}

/// Which log stream is loaded at startup
#[derive(Debug, Clone)]
pub struct LogViewOptions {
    pub page_size: u32,
    pub scope: LogScope,
    pub deployment_id: Option<String>,
    pub auto_scroll: bool,
}

impl Default for LogViewOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            scope: LogScope::Application,
            deployment_id: None,
            auto_scroll: true,
        }
    }
}

impl LogViewOptions {
    /// Resource id for the initial log view. Deployment scope without a
    /// deployment id falls back to the application.
    pub fn resource(&self, application_id: &str) -> (LogScope, String) {
        match (self.scope, &self.deployment_id) {
            (LogScope::Deployment, Some(id)) if !id.is_empty() => (LogScope::Deployment, id.clone()),
            _ => (LogScope::Application, application_id.to_string()),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}
