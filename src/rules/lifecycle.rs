//! Reload-gated creation and deletion of rule files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{MutationError, MutationResult};
use crate::observability::metrics;
use crate::prometheus::{write_atomic, PrometheusClient};
use crate::rules::validator::{Validator, RULES_SCHEMA};

pub const CREATED_MESSAGE: &str = "The rule was created successfully";
pub const REPLACED_MESSAGE: &str = "The rule was updated successfully";
pub const DELETED_MESSAGE: &str = "The rule was deleted successfully";

/// Naming and timing settings for the rule directory.
#[derive(Debug, Clone)]
pub struct RuleDirectory {
    pub path: PathBuf,
    pub file_prefix: String,
    pub file_extension: String,
    /// Pause between writing a file and asking Prometheus to reload.
    pub settle_delay: Duration,
}

/// A rule file that Prometheus accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleCommit {
    pub file: String,
    /// False when an existing file was replaced.
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFileInfo {
    pub file: String,
    pub size: u64,
}

/// Creates and deletes rule files, committing them only once Prometheus reloads.
#[derive(Clone)]
pub struct RuleFileManager {
    directory: RuleDirectory,
    client: PrometheusClient,
    validator: Arc<dyn Validator>,
}

impl RuleFileManager {
    pub fn new(directory: RuleDirectory, client: PrometheusClient, validator: Arc<dyn Validator>) -> Self {
        Self {
            directory,
            client,
            validator,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory.path
    }

    /// Validate, write and reload a rule document.
    ///
    /// Without `filename` a name is generated from the configured prefix and
    /// extension. When the reload fails the write is rolled back: a new file
    /// is removed, a replaced file gets its previous content back.
    pub async fn create_rule(&self, rule: &Value, filename: Option<&str>) -> MutationResult<RuleCommit> {
        let file = self.file_name(filename)?;
        self.write_rule(rule, file).await
    }

    /// The caller's name after checking it, or a freshly generated one.
    pub fn file_name(&self, filename: Option<&str>) -> MutationResult<String> {
        match filename {
            Some(name) => {
                check_filename(name)?;
                Ok(name.to_string())
            }
            None => Ok(self.generate_name()),
        }
    }

    /// Validate `rule` and commit it under `file`.
    ///
    /// Write, reload and rollback run on their own task: dropping the returned
    /// future (request timeout, client gone) never leaves an uncommitted file.
    pub async fn write_rule(&self, rule: &Value, file: String) -> MutationResult<RuleCommit> {
        check_filename(&file)?;
        let path = self.directory.path.join(&file);

        self.validator
            .validate(RULES_SCHEMA, rule)
            .map_err(|report| MutationError::Validation(report.to_string()))?;

        let contents = serde_yaml::to_string(rule).map_err(|e| MutationError::Write {
            path: path.clone(),
            cause: e.to_string(),
        })?;

        let manager = self.clone();
        tokio::spawn(async move { manager.commit(file, path, contents).await })
            .await
            .map_err(|e| MutationError::Io {
                path: self.directory.path.clone(),
                cause: format!("rule commit task failed: {e}"),
            })?
    }

    async fn commit(&self, file: String, path: PathBuf, contents: String) -> MutationResult<RuleCommit> {
        let previous = match fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(io_error(&path, e)),
        };

        write_atomic(&path, contents.as_bytes()).map_err(|e| write_error(&path, e))?;
        tracing::debug!(file = %file, replaced = previous.is_some(), "Rule file written");

        // Give the file watcher on the Prometheus side a moment to see the write.
        tokio::time::sleep(self.directory.settle_delay).await;

        let reload = self.client.reload().await;
        if !reload.success {
            let created = previous.is_none();
            self.roll_back(&file, &path, previous);
            tracing::debug!(file = %file, created, "Rule file not committed");
            return Err(reload.into_error());
        }

        tracing::info!(file = %file, "Rule file committed");
        Ok(RuleCommit {
            file,
            created: previous.is_none(),
        })
    }

    /// Remove a rule file and reload.
    ///
    /// A failed reload is reported, but the file is not restored.
    pub async fn delete_rule(&self, filename: &str) -> MutationResult<()> {
        check_filename(filename)?;
        let path = self.directory.path.join(filename);
        if !path.is_file() {
            return Err(MutationError::NotFound("File not found".into()));
        }

        fs::remove_file(&path).map_err(|e| write_error(&path, e))?;
        tracing::debug!(file = %filename, "Rule file removed");

        let reload = self.client.reload().await;
        if !reload.success {
            return Err(reload.into_error());
        }

        tracing::info!(file = %filename, "Rule file deletion committed");
        Ok(())
    }

    /// Rule files in the directory, sorted by name. Hidden files are skipped.
    pub fn list_rules(&self) -> MutationResult<Vec<RuleFileInfo>> {
        let entries = fs::read_dir(&self.directory.path).map_err(|e| io_error(&self.directory.path, e))?;

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            match entry.metadata() {
                Ok(metadata) if metadata.is_file() => files.push(RuleFileInfo {
                    file: name,
                    size: metadata.len(),
                }),
                _ => {}
            }
        }
        files.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(files)
    }

    /// Parsed content of one rule file.
    pub fn read_rule(&self, filename: &str) -> MutationResult<Value> {
        check_filename(filename)?;
        let path = self.directory.path.join(filename);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(MutationError::NotFound("File not found".into()));
            }
            Err(e) => return Err(io_error(&path, e)),
        };
        serde_yaml::from_str(&text).map_err(|e| MutationError::Parse(format!("{filename}: {e}")))
    }

    fn generate_name(&self) -> String {
        let prefix = if self.directory.file_prefix.is_empty() {
            String::new()
        } else {
            format!("{}-", self.directory.file_prefix)
        };
        format!("{prefix}{}{}", Uuid::new_v4(), self.directory.file_extension)
    }

    /// Best effort: a failure here is logged and never replaces the reload error.
    fn roll_back(&self, file: &str, path: &Path, previous: Option<Vec<u8>>) {
        let result = match previous {
            Some(bytes) => write_atomic(path, &bytes),
            None => fs::remove_file(path),
        };
        match result {
            Ok(()) => {
                tracing::info!(file = %file, "Rolled back rule file after failed reload");
                metrics::record_rollback(true);
            }
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "Rule file rollback failed");
                metrics::record_rollback(false);
            }
        }
    }
}

/// Rule files are addressed by a single path component.
fn check_filename(name: &str) -> MutationResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && name != ".."
        && !name.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(MutationError::Validation(format!("invalid rule file name '{name}'")))
    }
}

fn write_error(path: &Path, cause: io::Error) -> MutationError {
    tracing::error!(path = %path.display(), error = %cause, "Rule file I/O failed");
    MutationError::Write {
        path: path.to_path_buf(),
        cause: cause.to_string(),
    }
}

fn io_error(path: &Path, cause: io::Error) -> MutationError {
    tracing::error!(path = %path.display(), error = %cause, "Rule file read failed");
    MutationError::Io {
        path: path.to_path_buf(),
        cause: cause.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::validator::JsonSchemaValidator;

    fn manager(dir: &Path, prefix: &str) -> RuleFileManager {
        // Nothing listens here; these tests never reach the reload step.
        let client = PrometheusClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        RuleFileManager::new(
            RuleDirectory {
                path: dir.to_path_buf(),
                file_prefix: prefix.to_string(),
                file_extension: ".yml".to_string(),
                settle_delay: Duration::ZERO,
            },
            client,
            Arc::new(JsonSchemaValidator::new().unwrap()),
        )
    }

    #[test]
    fn test_generated_names() {
        let dir = tempfile::tempdir().unwrap();
        let name = manager(dir.path(), "team").generate_name();
        assert!(name.starts_with("team-"));
        assert!(name.ends_with(".yml"));

        let bare = manager(dir.path(), "").generate_name();
        assert!(Uuid::parse_str(bare.trim_end_matches(".yml")).is_ok());
    }

    #[test]
    fn test_check_filename() {
        assert!(check_filename("alerts.yml").is_ok());
        for bad in ["", "..", ".hidden.yml", "../etc/passwd", "a/b.yml", "a\\b.yml"] {
            assert!(check_filename(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_invalid_rule_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), "");
        let err = manager
            .create_rule(&serde_json::json!({"groups": "nope"}), None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(manager.list_rules().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = manager(dir.path(), "").delete_rule("absent.yml").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_list_and_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.yml"), "groups: []\n").unwrap();
        fs::write(dir.path().join("a.yml"), "groups:\n  - name: g\n    rules: []\n").unwrap();
        fs::write(dir.path().join(".a.yml.tmp"), "partial").unwrap();

        let manager = manager(dir.path(), "");
        let files: Vec<String> = manager.list_rules().unwrap().into_iter().map(|f| f.file).collect();
        assert_eq!(files, vec!["a.yml", "b.yml"]);

        let doc = manager.read_rule("a.yml").unwrap();
        assert_eq!(doc["groups"][0]["name"], "g");
        assert_eq!(manager.read_rule("c.yml").unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_read_failures_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested.yml")).unwrap();
        let mgr = manager(dir.path(), "");
        let err = mgr.read_rule("nested.yml").unwrap_err();
        assert!(matches!(err, MutationError::Io { .. }), "{err:?}");
        assert_eq!(err.status_code(), 500);

        let missing = manager(&dir.path().join("absent"), "");
        assert!(matches!(missing.list_rules().unwrap_err(), MutationError::Io { .. }));
    }

    #[test]
    fn test_file_name_checks_caller_names() {
        let dir = tempfile::tempdir().unwrap();
        let manager = manager(dir.path(), "team");
        assert_eq!(manager.file_name(Some("a.yml")).unwrap(), "a.yml");
        assert_eq!(manager.file_name(Some("../a.yml")).unwrap_err().status_code(), 400);
        assert!(manager.file_name(None).unwrap().starts_with("team-"));
    }
}
