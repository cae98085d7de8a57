//! Configuration sidecar for a Prometheus server.

pub mod coordinator;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod merge;
pub mod observability;
pub mod prometheus;
pub mod rules;
pub mod settings;

pub use coordinator::{ConfigCoordinator, OperationResult};
pub use error::{MutationError, MutationResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use settings::SidecarConfig;
