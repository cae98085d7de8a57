//! Monitoring server access.
//!
//! # Data Flow
//! ```text
//! GET /api/v1/status/config
//!     → client.rs (fetch, classify failures)
//!     → document.rs (parse YAML into ConfigDocument)
//!
//! merged ConfigDocument
//!     → writer.rs (serialize, temp file + rename)
//!     → client.rs (POST /-/reload, classify outcome)
//! ```
//!
//! # Design Decisions
//! - The live server is the only source of truth; documents are never cached
//! - No retries at this layer, the caller decides

pub mod client;
pub mod document;
pub mod writer;

pub use client::{PrometheusClient, ReloadResult};
pub use document::{ConfigDocument, DocumentError, Section, UnknownSection};
pub use writer::{write_atomic, ConfigWriter, StagedFile};
