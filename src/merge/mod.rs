//! Part merge engine.
//!
//! # Data Flow
//! ```text
//! current section value + partial payload
//!     → Section::policy() (static, one per section)
//!     → engine.rs (apply the policy)
//!     → deep.rs (recursive structural merge where the policy asks for it)
//!     → new section value
//! ```
//!
//! # Design Decisions
//! - The policy is declared per section name, never inferred from the
//!   runtime shape of the payload
//! - Pure transformation: no I/O, the caller persists the result
//! - `null` in a payload means "not specified" and leaves the current value

pub mod deep;
pub mod engine;

pub use deep::{deep_merge, ListMerge};
pub use engine::{merge, remove_entry, remove_values};

use thiserror::Error;

use crate::prometheus::Section;

/// How a payload is combined with the current value of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The payload replaces the section wholesale.
    Replace,
    /// One-level object assign: defined payload fields overwrite, the rest stay.
    Overlay,
    /// Recursive object merge; nested lists in the payload replace current lists.
    DeepOverlay,
    /// Sequence of scalars with set semantics.
    AppendDedupSet,
    /// Sequence of mappings identified by `key`; matches are deep-merged.
    MergeByKey { key: &'static str },
}

/// Errors raised by the merge engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("section '{section}' expects {expected}")]
    ShapeMismatch {
        section: Section,
        expected: &'static str,
    },

    #[error("{section} entry '{key}' not found")]
    NotFound { section: Section, key: String },

    #[error("section '{section}' does not support {operation}")]
    Unsupported {
        section: Section,
        operation: &'static str,
    },
}
