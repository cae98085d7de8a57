//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the coordinator, rule manager and forwarder from settings
//! - Create the Axum router: management API, health, metrics, fallback forwarding
//! - Wire up middleware (request ID, tracing, timeout, body limit, metrics)
//! - Serve until the shutdown channel fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::coordinator::ConfigCoordinator;
use crate::http::proxy::{forward_handler, Forwarder};
use crate::http::request::{request_span, track_metrics, X_REQUEST_ID};
use crate::http::{api, rules};
use crate::prometheus::{ConfigWriter, PrometheusClient};
use crate::rules::{JsonSchemaValidator, RuleDirectory, RuleFileManager, SchemaError};
use crate::settings::SidecarConfig;

/// Paths owned by the API; the metrics endpoint must not collide with them.
const RESERVED_PREFIXES: [&str; 2] = ["/api/v1/", "/health"];

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<ConfigCoordinator>,
    pub rules: Arc<RuleFileManager>,
    pub forwarder: Forwarder,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build Prometheus client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid upstream address: {0}")]
    Upstream(#[from] axum::http::uri::InvalidUri),

    #[error("metrics path '{0}' collides with an API route")]
    MetricsPath(String),
}

/// HTTP server for the sidecar.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create the server. `metrics` is rendered on the configured metrics path when present.
    pub fn new(config: &SidecarConfig, metrics: Option<PrometheusHandle>) -> Result<Self, ServerError> {
        let client = PrometheusClient::new(
            &config.prometheus.address,
            Duration::from_secs(config.prometheus.request_timeout_secs),
        )?;

        let coordinator = ConfigCoordinator::new(
            client.clone(),
            ConfigWriter::new(config.prometheus.config_file.clone()),
        );

        let directory = RuleDirectory {
            path: config.rules.directory.clone(),
            file_prefix: config.rules.file_prefix.clone(),
            file_extension: config.rules.file_extension.clone(),
            settle_delay: Duration::from_millis(config.rules.settle_delay_ms),
        };
        let validator = Arc::new(JsonSchemaValidator::new()?);
        let rules = RuleFileManager::new(directory, client, validator);

        let state = AppState {
            coordinator: Arc::new(coordinator),
            rules: Arc::new(rules),
            forwarder: Forwarder::new(&config.prometheus.address)?,
        };

        let router = Self::build_router(config, state, metrics)?;
        Ok(Self { router })
    }

    /// The fully layered router, for serving or for driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(
        config: &SidecarConfig,
        state: AppState,
        metrics: Option<PrometheusHandle>,
    ) -> Result<Router, ServerError> {
        let mut router = Router::new()
            .route("/api/v1/configs", get(api::get_document).put(api::put_document))
            .route(
                "/api/v1/config/{section}",
                get(api::get_section)
                    .patch(api::patch_section)
                    .delete(api::delete_section),
            )
            .route("/api/v1/rules", get(rules::list_rules).post(rules::create_rule))
            .route(
                "/api/v1/rules/{file}",
                get(rules::get_rule)
                    .put(rules::replace_rule)
                    .delete(rules::delete_rule),
            )
            .route("/health", get(health));

        if let Some(handle) = metrics {
            let path = config.observability.metrics_path.clone();
            if RESERVED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
                return Err(ServerError::MetricsPath(path));
            }
            router = router.route(
                &path,
                get(move || {
                    let handle = handle.clone();
                    async move { handle.render() }
                }),
            );
        }

        Ok(router
            .fallback(forward_handler)
            .with_state(state)
            .layer(middleware::from_fn(track_metrics))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .layer(TraceLayer::new_for_http().make_span_with(request_span))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)))
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
