//! Mutation orchestration.
//!
//! # State Machine
//! ```text
//! Fetch ──fail──▶ error (untouched)
//!   │
//! Merge ──fail──▶ Validation / NotFound
//!   │
//! Persist ─fail─▶ Write (file unchanged, no reload)
//!   │
//! Reload ──fail─▶ ReloadFailed (file already written)
//!   │
//! Committed
//! ```
//!
//! # Design Decisions
//! - Each step runs exactly once; a failure aborts the remaining steps
//! - No in-process document cache and no lock: concurrent writers race,
//!   last writer wins

pub mod orchestrator;
pub mod result;

pub use orchestrator::{ConfigCoordinator, UPDATED_MESSAGE};
pub use result::{OperationResult, Status};
