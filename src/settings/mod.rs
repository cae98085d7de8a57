//! Sidecar settings subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → command-line / environment overrides
//!     → validation.rs (semantic checks)
//!     → SidecarConfig (validated, immutable for the process lifetime)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal settings
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_settings, parse_settings, Overrides, SettingsError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, PrometheusConfig, RulesConfig, SecurityConfig,
    SidecarConfig, TimeoutConfig,
};
pub use validation::{validate_settings, SettingsValidationError};
