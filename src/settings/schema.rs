//! Settings schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file and
//! every field has a default, so an empty file is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings for the sidecar.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SidecarConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The monitoring server being managed.
    pub prometheus: PrometheusConfig,

    /// Rule file directory and naming.
    pub rules: RulesConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Monitoring server address and configuration file location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// Base URL of the Prometheus HTTP API. Plain `http` only: forwarded
    /// requests go through a client without TLS.
    pub address: String,

    /// Path of the configuration file Prometheus loads on reload.
    pub config_file: PathBuf,

    /// Timeout for config fetch and reload requests in seconds.
    pub request_timeout_secs: u64,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            address: "http://localhost:9090".to_string(),
            config_file: PathBuf::from("/etc/prometheus/prometheus.yml"),
            request_timeout_secs: 10,
        }
    }
}

/// Rule file settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Directory rule files are written to.
    pub directory: PathBuf,

    /// Prefix for generated file names, joined with `-`.
    pub file_prefix: String,

    /// Extension appended to generated file names.
    pub file_extension: String,

    /// Delay between writing a rule file and reloading, in milliseconds.
    pub settle_delay_ms: u64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("/etc/prometheus/rules"),
            file_prefix: String::new(),
            file_extension: ".yml".to_string(),
            settle_delay_ms: 100,
        }
    }
}

/// Timeout configuration.
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

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the metrics endpoint.
    pub metrics_enabled: bool,

    /// Path the metrics endpoint is served on.
    pub metrics_path: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: true,
            metrics_path: "/api-metrics".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
