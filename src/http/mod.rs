//! HTTP adapter over the coordinator and rule manager.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID span, request metrics)
//!     → api.rs / rules.rs (decode body, call the core)
//!        or proxy.rs (anything else, forwarded to Prometheus)
//!     → response.rs (status code and error body)
//! ```

pub mod api;
pub mod proxy;
pub mod request;
pub mod response;
pub mod rules;
pub mod server;

pub use proxy::Forwarder;
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
