//! Settings loading from disk and the command line.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::settings::schema::{LogFormat, SidecarConfig};
use crate::settings::validation::{validate_settings, SettingsValidationError};

/// Error type for settings loading.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<SettingsValidationError>),
}

fn join(errors: &[SettingsValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Command-line and environment overrides, applied on top of the file.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct Overrides {
    /// Prometheus base URL
    #[arg(long = "prom.addr", env = "PROM_ADDR")]
    pub prom_addr: Option<String>,

    /// Prometheus configuration file
    #[arg(long = "config.file", env = "PROM_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    /// Directory rule files are written to
    #[arg(long = "rule.path", env = "PROM_RULE_PATH")]
    pub rule_path: Option<PathBuf>,

    /// Prefix for generated rule file names
    #[arg(long = "file.prefix", env = "RULE_FILE_PREFIX")]
    pub file_prefix: Option<String>,

    /// Extension for generated rule file names
    #[arg(long = "file.extension", env = "RULE_FILE_EXTENSION")]
    pub file_extension: Option<String>,

    /// Address to listen on
    #[arg(long = "web.listen-address", env = "LISTEN_ADDRESS")]
    pub listen_address: Option<String>,

    /// Log level
    #[arg(long = "log.level", env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log format
    #[arg(long = "log.format", env = "LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Overrides {
    pub fn apply(&self, config: &mut SidecarConfig) {
        if let Some(v) = &self.prom_addr {
            config.prometheus.address = v.clone();
        }
        if let Some(v) = &self.config_file {
            config.prometheus.config_file = v.clone();
        }
        if let Some(v) = &self.rule_path {
            config.rules.directory = v.clone();
        }
        if let Some(v) = &self.file_prefix {
            config.rules.file_prefix = v.clone();
        }
        if let Some(v) = &self.file_extension {
            config.rules.file_extension = v.clone();
        }
        if let Some(v) = &self.listen_address {
            config.listener.bind_address = v.clone();
        }
        if let Some(v) = &self.log_level {
            config.observability.log_level = v.clone();
        }
        if let Some(v) = self.log_format {
            config.observability.log_format = v;
        }
    }
}

/// Parse settings from TOML text without validating them.
pub fn parse_settings(content: &str) -> Result<SidecarConfig, SettingsError> {
    Ok(toml::from_str(content)?)
}

/// Load settings from `path` (or defaults), apply overrides, then validate.
pub fn load_settings(path: Option<&Path>, overrides: &Overrides) -> Result<SidecarConfig, SettingsError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            parse_settings(&content)?
        }
        None => SidecarConfig::default(),
    };

    overrides.apply(&mut config);
    validate_settings(&config).map_err(SettingsError::Validation)?;

    Ok(config)
}
