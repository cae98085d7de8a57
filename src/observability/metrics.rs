//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sidecar_mutations_total` (counter): configuration mutations by section, outcome
//! - `sidecar_reloads_total` (counter): reload attempts by outcome
//! - `sidecar_rule_rollbacks_total` (counter): rule file rollbacks by outcome
//! - `sidecar_http_requests_total` (counter): API requests by method, status
//! - `sidecar_http_request_duration_seconds` (histogram): API latency

use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and return a handle for rendering.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

pub fn record_mutation(section: &str, outcome: &'static str) {
    metrics::counter!(
        "sidecar_mutations_total",
        "section" => section.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("sidecar_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_rollback(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("sidecar_rule_rollbacks_total", "outcome" => outcome).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    metrics::counter!(
        "sidecar_http_requests_total",
        "method" => method.clone(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("sidecar_http_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}
