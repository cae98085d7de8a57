//! Settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, paths and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: SidecarConfig → Result<(), Vec<SettingsValidationError>>

use std::fmt;
use std::net::SocketAddr;

use crate::settings::SidecarConfig;

const MAX_SETTLE_DELAY_MS: u64 = 10_000;

/// A single semantic problem with the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsValidationError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for SettingsValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_settings(config: &SidecarConfig) -> Result<(), Vec<SettingsValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &'static str, message: String| {
        errors.push(SettingsValidationError { field, message });
    };

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        fail(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        );
    }

    match url::Url::parse(&config.prometheus.address) {
        Ok(url) if url.scheme() == "http" && url.has_host() => {}
        Ok(url) if url.scheme() == "https" => fail(
            "prometheus.address",
            format!(
                "'{}': https is not supported, the request forwarder speaks plain http",
                config.prometheus.address
            ),
        ),
        Ok(_) => fail(
            "prometheus.address",
            format!("'{}' must be an http URL with a host", config.prometheus.address),
        ),
        Err(e) => fail(
            "prometheus.address",
            format!("'{}' is not a URL: {}", config.prometheus.address, e),
        ),
    }

    if config.prometheus.config_file.as_os_str().is_empty() {
        fail("prometheus.config_file", "must not be empty".to_string());
    }
    if config.prometheus.request_timeout_secs == 0 {
        fail("prometheus.request_timeout_secs", "must be greater than 0".to_string());
    }

    if config.rules.directory.as_os_str().is_empty() {
        fail("rules.directory", "must not be empty".to_string());
    }
    let extension = &config.rules.file_extension;
    if !extension.is_empty() && (!extension.starts_with('.') || extension.contains(['/', '\\'])) {
        fail(
            "rules.file_extension",
            format!("'{extension}' must start with '.' and contain no path separator"),
        );
    }
    if config.rules.file_prefix.contains(['/', '\\']) {
        fail("rules.file_prefix", "must not contain a path separator".to_string());
    }
    if config.rules.settle_delay_ms > MAX_SETTLE_DELAY_MS {
        fail(
            "rules.settle_delay_ms",
            format!("must be at most {MAX_SETTLE_DELAY_MS}"),
        );
    }

    if config.timeouts.request_secs == 0 {
        fail("timeouts.request_secs", "must be greater than 0".to_string());
    }
    // A rule commit (settle + reload) must finish inside the request deadline.
    let commit_ms = config
        .rules
        .settle_delay_ms
        .saturating_add(config.prometheus.request_timeout_secs.saturating_mul(1000));
    if config.timeouts.request_secs > 0 && commit_ms >= config.timeouts.request_secs.saturating_mul(1000) {
        fail(
            "timeouts.request_secs",
            format!(
                "must exceed rules.settle_delay_ms + prometheus.request_timeout_secs ({commit_ms} ms)"
            ),
        );
    }
    if !config.observability.metrics_path.starts_with('/') {
        fail("observability.metrics_path", "must start with '/'".to_string());
    }
    if config.security.max_body_size == 0 {
        fail("security.max_body_size", "must be greater than 0".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_settings(&SidecarConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = SidecarConfig::default();
        config.listener.bind_address = "nope".into();
        config.prometheus.address = "ftp://prom".into();
        config.rules.file_extension = "yml".into();
        config.timeouts.request_secs = 0;

        let fields: Vec<&str> = validate_settings(&config)
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "prometheus.address",
                "rules.file_extension",
                "timeouts.request_secs"
            ]
        );
    }

    #[test]
    fn test_request_deadline_covers_rule_commit() {
        let mut config = SidecarConfig::default();
        config.timeouts.request_secs = 1;
        config.rules.settle_delay_ms = 2000;
        let errors = validate_settings(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "timeouts.request_secs");

        config.timeouts.request_secs = 13;
        config.prometheus.request_timeout_secs = 10;
        assert!(validate_settings(&config).is_ok());
    }

    #[test]
    fn test_rejects_https_address() {
        let mut config = SidecarConfig::default();
        config.prometheus.address = "https://prom:9090".into();
        let errors = validate_settings(&config).unwrap_err();
        assert_eq!(errors[0].field, "prometheus.address");
        assert!(errors[0].message.contains("https is not supported"));
    }

    #[test]
    fn test_rejects_prefix_with_separator() {
        let mut config = SidecarConfig::default();
        config.rules.file_prefix = "../escape".into();
        assert!(validate_settings(&config).is_err());
    }
}
