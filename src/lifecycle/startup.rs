//! Startup checks on the filesystem the sidecar writes to.

use std::fs;
use std::io;

use crate::settings::SidecarConfig;

/// Create the rule directory if needed and check the configuration file's directory exists.
///
/// Fails fast: a sidecar that cannot write either location is useless.
pub fn prepare_filesystem(config: &SidecarConfig) -> io::Result<()> {
    let config_file = &config.prometheus.config_file;
    if let Some(parent) = config_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("configuration directory {} does not exist", parent.display()),
            ));
        }
    }

    fs::create_dir_all(&config.rules.directory)?;
    tracing::info!(
        config_file = %config_file.display(),
        rule_directory = %config.rules.directory.display(),
        "Filesystem ready"
    );
    Ok(())
}
