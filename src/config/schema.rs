//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Log channels, file groups and rotation.
    pub logging: LoggingConfig,

    /// External failure-notification endpoint.
    pub notify: NotifyConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Diagnostics and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Logging configuration shared by both channels.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory holding every file group of this deployment.
    pub dir: String,

    /// Base name of the request-access file group.
    pub access_file: String,

    /// Base name of the catch-all application file group.
    pub app_file: String,

    /// Base name of the error-only file group.
    pub error_file: String,

    /// Size threshold of a single segment ("20m", "512k", "1g" or plain bytes).
    pub max_size: String,

    /// Retention window: "14d" deletes segments older than fourteen days,
    /// "14" keeps fourteen files.
    pub max_files: String,

    /// Gzip segments once they are rotated out.
    pub zipped_archive: bool,

    /// Date buckets follow UTC when true, local time otherwise.
    pub utc: bool,

    /// Mirror every channel to stdout.
    pub console: bool,

    /// Colorize console output.
    pub colorize: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".to_string(),
            access_file: "request.log".to_string(),
            app_file: "server.log".to_string(),
            error_file: "error.log".to_string(),
            max_size: "20m".to_string(),
            max_files: "14d".to_string(),
            zipped_archive: true,
            utc: true,
            console: true,
            colorize: true,
        }
    }
}

/// Notification endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Destination URL. Absence is reported when a notification is attempted.
    pub url: Option<String>,

    /// User sent along with every notification unless the caller supplies one.
    pub user: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// How long shutdown waits for outstanding notifications, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: None,
            timeout_secs: 10,
            shutdown_grace_secs: 5,
        }
    }
}

/// Timeout configuration for request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Level of the service's own diagnostics (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
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
