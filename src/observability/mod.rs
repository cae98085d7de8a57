//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → metrics endpoint rendered by the Prometheus recorder
//! ```
//!
//! # Design Decisions
//! - Request ID flows through the trace layer span
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
