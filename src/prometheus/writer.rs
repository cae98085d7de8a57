//! Atomic persistence of configuration and rule files.
//!
//! Content is written to a hidden temporary file in the target's directory
//! and renamed over the target, so a reader sees either the old file or the
//! new one and never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::MutationError;
use crate::prometheus::ConfigDocument;

/// Mode of files that did not exist before the write.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Content written next to its target but not yet visible under the target name.
///
/// Dropping a staged file without committing removes the temporary file.
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    /// Write `contents` to a temporary file beside `target`.
    pub fn stage(target: &Path, contents: &[u8]) -> io::Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;

        // Prometheus may run as another user: keep the replaced file's mode,
        // and make new files world-readable instead of the 0600 temp default.
        match fs::metadata(target) {
            Ok(metadata) => fs::set_permissions(temp.path(), metadata.permissions())?,
            Err(_) => set_new_file_mode(temp.path())?,
        }

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Rename the staged content over the target.
    pub fn commit(self) -> io::Result<()> {
        self.temp.persist(&self.target).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(unix)]
fn set_new_file_mode(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn set_new_file_mode(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Replace `target` with `contents` atomically.
pub fn write_atomic(target: &Path, contents: &[u8]) -> io::Result<()> {
    StagedFile::stage(target, contents)?.commit()
}

/// Writes the main configuration file.
#[derive(Debug, Clone)]
pub struct ConfigWriter {
    path: PathBuf,
}

impl ConfigWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `document` and atomically replace the configuration file.
    ///
    /// On failure the previous file is left intact.
    pub fn write(&self, document: &ConfigDocument, sort_keys: bool) -> Result<(), MutationError> {
        let text = document.to_yaml(sort_keys).map_err(|e| self.write_error(e))?;
        write_atomic(&self.path, text.as_bytes()).map_err(|e| self.write_error(e))?;
        tracing::debug!(path = %self.path.display(), bytes = text.len(), "Configuration file written");
        Ok(())
    }

    fn write_error(&self, cause: impl std::fmt::Display) -> MutationError {
        tracing::error!(path = %self.path.display(), error = %cause, "Failed to write configuration file");
        MutationError::Write {
            path: self.path.clone(),
            cause: cause.to_string(),
        }
    }
}
