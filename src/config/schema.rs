//! Server settings schema.
//!
//! These settings shape the running service (listener, reload cadence,
//! HTTP behaviour, observability). The resource table itself is not part of
//! this schema; it lives in the resource file named by `resources.path`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root settings for the WebFinger server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Resource file location and reload behaviour.
    pub resources: ResourcesConfig,

    /// Request handling options.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    pub host: String,

    /// TCP port. Overridden by `PORT` when set.
    pub port: u16,
}

impl ListenerConfig {
    /// The `host:port` pair handed to the TCP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Resource file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// Path to the resource file.
    pub path: PathBuf,

    /// Seconds between periodic reloads.
    pub reload_interval_secs: u64,

    /// Also reload when the file changes on disk.
    pub watch: bool,
}

impl ResourcesConfig {
    pub fn reload_interval(&self) -> Duration {
        Duration::from_secs(self.reload_interval_secs)
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config.yaml"),
            reload_interval_secs: 30,
            watch: false,
        }
    }
}

/// HTTP handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Reject queries without a `resource` parameter (400) instead of
    /// falling back to the default subject.
    pub require_resource: bool,

    /// Add `Access-Control-Allow-Origin: *` to every response.
    pub cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            require_resource: false,
            cors: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
