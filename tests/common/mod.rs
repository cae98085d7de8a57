//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tempfile::TempDir;
use tokio::net::TcpListener;

use prometheus_config_proxy::{HttpServer, Shutdown, SidecarConfig};

struct MockState {
    config_file: PathBuf,
    loaded: Mutex<String>,
    failure: Mutex<Option<(u16, String)>>,
    config_failure: Mutex<Option<(u16, String)>>,
    reloads: AtomicU32,
}

/// A programmable stand-in for the Prometheus HTTP API.
///
/// Serves the loaded configuration and, like the real server, re-reads the
/// configuration file from disk on a successful reload.
pub struct MockPrometheus {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

impl MockPrometheus {
    /// Write `yaml` to `config_file`, load it, and start serving on an ephemeral port.
    pub async fn start(config_file: &Path, yaml: &str) -> Self {
        std::fs::write(config_file, yaml).unwrap();
        let state = Arc::new(MockState {
            config_file: config_file.to_path_buf(),
            loaded: Mutex::new(yaml.to_string()),
            failure: Mutex::new(None),
            config_failure: Mutex::new(None),
            reloads: AtomicU32::new(0),
        });

        let app = Router::new()
            .route("/api/v1/status/config", get(status_config))
            .route("/-/reload", post(reload))
            .route("/api/v1/query", get(query))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make every following reload answer with `status` and `message`.
    pub fn fail_reloads(&self, status: u16, message: &str) {
        *self.state.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Make the config endpoint answer with `status` and `message`.
    pub fn fail_config(&self, status: u16, message: &str) {
        *self.state.config_failure.lock().unwrap() = Some((status, message.to_string()));
    }

    /// Serve `yaml` as the loaded configuration without touching the file.
    pub fn serve_yaml(&self, yaml: &str) {
        *self.state.loaded.lock().unwrap() = yaml.to_string();
    }

    pub fn reload_count(&self) -> u32 {
        self.state.reloads.load(Ordering::SeqCst)
    }

    pub fn loaded_yaml(&self) -> serde_yaml::Value {
        serde_yaml::from_str(&self.state.loaded.lock().unwrap()).unwrap()
    }
}

async fn status_config(State(state): State<Arc<MockState>>) -> Response {
    if let Some((status, message)) = state.config_failure.lock().unwrap().clone() {
        return (StatusCode::from_u16(status).unwrap(), message).into_response();
    }
    let yaml = state.loaded.lock().unwrap().clone();
    Json(serde_json::json!({ "status": "success", "data": { "yaml": yaml } })).into_response()
}

async fn reload(State(state): State<Arc<MockState>>) -> (StatusCode, String) {
    state.reloads.fetch_add(1, Ordering::SeqCst);
    if let Some((status, message)) = state.failure.lock().unwrap().clone() {
        return (StatusCode::from_u16(status).unwrap(), message);
    }

    let text = match std::fs::read_to_string(&state.config_file) {
        Ok(text) => text,
        Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, format!("failed to reload config: {e}")),
    };
    if let Err(e) = serde_yaml::from_str::<serde_yaml::Value>(&text) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("failed to reload config: {e}"));
    }
    *state.loaded.lock().unwrap() = text;
    (StatusCode::OK, String::new())
}

async fn query() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "success",
        "data": { "resultType": "vector", "result": [] }
    }))
}

/// Sidecar settings pointing at `prometheus_url`, with files under `dir`.
pub fn sidecar_config(prometheus_url: &str, dir: &Path) -> SidecarConfig {
    let mut config = SidecarConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.prometheus.address = prometheus_url.to_string();
    config.prometheus.config_file = dir.join("prometheus.yml");
    config.prometheus.request_timeout_secs = 5;
    config.rules.directory = dir.join("rules");
    config.rules.settle_delay_ms = 0;
    std::fs::create_dir_all(&config.rules.directory).unwrap();
    config
}

/// A running sidecar in front of a mock Prometheus.
pub struct Harness {
    pub dir: TempDir,
    pub prometheus: MockPrometheus,
    pub config: SidecarConfig,
    pub base: String,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl Harness {
    pub async fn start(yaml: &str) -> Self {
        Self::start_with(yaml, |_| {}).await
    }

    /// Start with settings adjusted by `configure` before the server is built.
    pub async fn start_with(yaml: &str, configure: impl FnOnce(&mut SidecarConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let prometheus = MockPrometheus::start(&dir.path().join("prometheus.yml"), yaml).await;
        let mut config = sidecar_config(&prometheus.url(), dir.path());
        configure(&mut config);

        let server = HttpServer::new(&config, None).unwrap();
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let shutdown = Shutdown::new();
        let receiver = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = server.run(listener, receiver).await;
        });

        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        Self {
            dir,
            prometheus,
            config,
            base,
            client,
            shutdown,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// The configuration file as currently written on disk.
    pub fn config_on_disk(&self) -> serde_yaml::Value {
        let text = std::fs::read_to_string(&self.config.prometheus.config_file).unwrap();
        serde_yaml::from_str(&text).unwrap()
    }

    pub fn config_text(&self) -> String {
        std::fs::read_to_string(&self.config.prometheus.config_file).unwrap()
    }

    pub fn rule_path(&self, file: &str) -> PathBuf {
        self.config.rules.directory.join(file)
    }

    pub fn rule_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.config.rules.directory)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}
