//! HTTP client for the monitoring server.
//!
//! # Responsibilities
//! - Fetch the active configuration (`GET /api/v1/status/config`)
//! - Trigger a configuration reload (`POST /-/reload`)
//! - Classify upstream failures without retrying

use std::time::Duration;

use serde::Deserialize;

use crate::error::MutationError;
use crate::observability::metrics;
use crate::prometheus::ConfigDocument;

const CONFIG_PATH: &str = "/api/v1/status/config";
const RELOAD_PATH: &str = "/-/reload";

/// Outcome of a reload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadResult {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
}

impl ReloadResult {
    /// Convert a failed reload into the error reported to callers.
    pub fn into_error(self) -> MutationError {
        MutationError::ReloadFailed {
            status: self.status_code,
            message: self.message,
        }
    }
}

#[derive(Deserialize)]
struct ConfigEnvelope {
    data: ConfigData,
}

#[derive(Deserialize)]
struct ConfigData {
    yaml: String,
}

/// Client for one Prometheus instance.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    http: reqwest::Client,
    base_url: String,
}

impl PrometheusClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:9090`).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch and parse the configuration the server is currently running.
    pub async fn fetch_config(&self) -> Result<ConfigDocument, MutationError> {
        let url = format!("{}{}", self.base_url, CONFIG_PATH);
        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to reach Prometheus");
            MutationError::UpstreamUnreachable(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown status").to_string();
            tracing::warn!(url = %url, status = status.as_u16(), "Prometheus refused config request");
            return Err(MutationError::UpstreamError {
                code: status.as_u16(),
                reason,
            });
        }

        let envelope: ConfigEnvelope = response
            .json()
            .await
            .map_err(|e| MutationError::Parse(format!("unexpected config response: {e}")))?;

        ConfigDocument::from_yaml(&envelope.data.yaml).map_err(|e| MutationError::Parse(e.to_string()))
    }

    /// Ask the server to re-read its configuration from disk.
    ///
    /// Never fails: transport errors are folded into an unsuccessful result.
    pub async fn reload(&self) -> ReloadResult {
        let url = format!("{}{}", self.base_url, RELOAD_PATH);
        let result = match self.http.post(&url).send().await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => ReloadResult {
                        success: status.is_success(),
                        status_code: status.as_u16(),
                        message: body,
                    },
                    Err(e) => ReloadResult {
                        success: status.is_success(),
                        status_code: status.as_u16(),
                        message: format!("failed to read reload response: {e}"),
                    },
                }
            }
            Err(e) => ReloadResult {
                success: false,
                status_code: 500,
                message: e.to_string(),
            },
        };

        if result.success {
            tracing::info!(status = result.status_code, "Prometheus reloaded configuration");
        } else {
            tracing::warn!(
                status = result.status_code,
                message = %result.message.trim(),
                "Prometheus reload failed"
            );
        }
        metrics::record_reload(result.success);
        result
    }
}
