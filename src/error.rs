//! Error taxonomy shared by the configuration and rule workflows.

use std::path::PathBuf;

use thiserror::Error;

use crate::merge::MergeError;
use crate::prometheus::Section;

/// Errors that can occur while mutating the monitoring server's configuration.
#[derive(Debug, Error)]
pub enum MutationError {
    /// The monitoring server could not be reached.
    #[error("Failed to connect to Prometheus: {0}")]
    UpstreamUnreachable(String),

    /// The monitoring server answered with a non-success status.
    #[error("Prometheus returned {code}: {reason}")]
    UpstreamError { code: u16, reason: String },

    /// Configuration text from upstream or disk could not be decoded.
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// The payload failed validation.
    #[error("{0}")]
    Validation(String),

    /// A local filesystem write failed.
    #[error("Failed to write {}: {cause}", path.display())]
    Write { path: PathBuf, cause: String },

    /// A local filesystem read failed.
    #[error("Failed to read {}: {cause}", path.display())]
    Io { path: PathBuf, cause: String },

    /// The delete target does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The server rejected or failed to apply the new configuration.
    #[error("{message}")]
    ReloadFailed { status: u16, message: String },

    /// The section's merge policy does not support the operation.
    #[error("Section '{section}' does not support {operation}")]
    Unsupported {
        section: Section,
        operation: &'static str,
    },
}

impl MutationError {
    /// HTTP status the error is surfaced with.
    pub fn status_code(&self) -> u16 {
        match self {
            MutationError::UpstreamUnreachable(_) => 500,
            MutationError::UpstreamError { code, .. } => *code,
            MutationError::Parse(_) => 500,
            MutationError::Validation(_) => 400,
            MutationError::Write { .. } => 500,
            MutationError::Io { .. } => 500,
            MutationError::NotFound(_) => 404,
            MutationError::ReloadFailed { status, .. } => *status,
            MutationError::Unsupported { .. } => 405,
        }
    }

    /// Short label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MutationError::UpstreamUnreachable(_) => "upstream_unreachable",
            MutationError::UpstreamError { .. } => "upstream_error",
            MutationError::Parse(_) => "parse_error",
            MutationError::Validation(_) => "validation_error",
            MutationError::Write { .. } => "write_error",
            MutationError::Io { .. } => "io_error",
            MutationError::NotFound(_) => "not_found",
            MutationError::ReloadFailed { .. } => "reload_failed",
            MutationError::Unsupported { .. } => "unsupported",
        }
    }
}

impl From<MergeError> for MutationError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::ShapeMismatch { .. } => MutationError::Validation(err.to_string()),
            MergeError::NotFound { section, key } => match section {
                Section::ScrapeConfigs => {
                    MutationError::NotFound(format!("Scrape config '{key}' not found"))
                }
                _ => MutationError::NotFound(format!("{section} entry '{key}' not found")),
            },
            MergeError::Unsupported { section, operation } => {
                MutationError::Unsupported { section, operation }
            }
        }
    }
}

/// Result type for mutation workflows.
pub type MutationResult<T> = Result<T, MutationError>;
