//! Section update flow: fetch → merge → persist → reload.

use serde_yaml::{Mapping, Value};

use crate::coordinator::OperationResult;
use crate::error::{MutationError, MutationResult};
use crate::merge;
use crate::observability::metrics;
use crate::prometheus::{ConfigDocument, ConfigWriter, PrometheusClient, Section};

pub const UPDATED_MESSAGE: &str = "Configuration updated successfully";

/// Ties the accessor, merge engine, writer and reload into one operation per call.
///
/// Holds no document between calls; every mutation starts from a fresh fetch.
#[derive(Debug, Clone)]
pub struct ConfigCoordinator {
    client: PrometheusClient,
    writer: ConfigWriter,
}

impl ConfigCoordinator {
    pub fn new(client: PrometheusClient, writer: ConfigWriter) -> Self {
        Self { client, writer }
    }

    pub fn client(&self) -> &PrometheusClient {
        &self.client
    }

    /// The whole live document.
    pub async fn document(&self) -> MutationResult<ConfigDocument> {
        self.client.fetch_config().await
    }

    /// The live value of one section. Absent list sections read as empty lists.
    pub async fn section(&self, section: Section) -> MutationResult<Value> {
        let document = self.client.fetch_config().await?;
        Ok(match document.section(section) {
            Some(value) => value.clone(),
            None if section.is_list() => Value::Sequence(Vec::new()),
            None => Value::Null,
        })
    }

    /// Merge `patch` into `section` using the section's policy.
    pub async fn patch_section(
        &self,
        section: Section,
        patch: Value,
        sort_keys: bool,
    ) -> MutationResult<OperationResult> {
        self.mutate(section.as_str(), sort_keys, |document| {
            let current = document.section(section).cloned();
            let merged = merge::merge(section, current, patch)?;
            document.set_section(section, merged);
            Ok(())
        })
        .await
    }

    /// Remove `values` from a set-shaped section (`rule_files`, `scrape_config_files`).
    pub async fn remove_values(
        &self,
        section: Section,
        values: Value,
        sort_keys: bool,
    ) -> MutationResult<OperationResult> {
        self.mutate(section.as_str(), sort_keys, |document| {
            let current = document.section(section).cloned();
            let remaining = merge::remove_values(section, current, values)?;
            document.set_section(section, remaining);
            Ok(())
        })
        .await
    }

    /// Remove the scrape config with `job_name`. Fails with `NotFound` when absent.
    pub async fn delete_scrape_config(
        &self,
        job_name: &str,
        sort_keys: bool,
    ) -> MutationResult<OperationResult> {
        let section = Section::ScrapeConfigs;
        self.mutate(section.as_str(), sort_keys, |document| {
            let current = document.section(section).cloned();
            let remaining = merge::remove_entry(section, current, job_name)?;
            document.set_section(section, remaining);
            Ok(())
        })
        .await
    }

    /// Apply a multi-section patch; each present section uses its own policy.
    ///
    /// Unknown section keys are rejected before anything is written.
    pub async fn patch_document(
        &self,
        patch: Mapping,
        sort_keys: bool,
    ) -> MutationResult<OperationResult> {
        let mut sections = Vec::with_capacity(patch.len());
        for (key, value) in patch {
            let name = key
                .as_str()
                .ok_or_else(|| MutationError::Validation("section names must be strings".into()))?;
            let section: Section = name
                .parse()
                .map_err(|e: crate::prometheus::UnknownSection| MutationError::Validation(e.to_string()))?;
            sections.push((section, value));
        }

        self.mutate("configs", sort_keys, |document| {
            for (section, value) in sections {
                let current = document.section(section).cloned();
                let merged = merge::merge(section, current, value)?;
                document.set_section(section, merged);
            }
            Ok(())
        })
        .await
    }

    async fn mutate<F>(&self, target: &str, sort_keys: bool, apply: F) -> MutationResult<OperationResult>
    where
        F: FnOnce(&mut ConfigDocument) -> MutationResult<()>,
    {
        let outcome = self.run(target, sort_keys, apply).await;
        match &outcome {
            Ok(_) => {
                tracing::info!(section = %target, "Configuration committed");
                metrics::record_mutation(target, "committed");
            }
            Err(e) => {
                tracing::warn!(section = %target, kind = e.kind(), error = %e, "Configuration mutation failed");
                metrics::record_mutation(target, e.kind());
            }
        }
        outcome
    }

    async fn run<F>(&self, target: &str, sort_keys: bool, apply: F) -> MutationResult<OperationResult>
    where
        F: FnOnce(&mut ConfigDocument) -> MutationResult<()>,
    {
        tracing::debug!(section = %target, stage = "fetch", "Fetching live configuration");
        let mut document = self.client.fetch_config().await?;

        tracing::debug!(section = %target, stage = "merge", "Merging payload");
        apply(&mut document)?;

        tracing::debug!(section = %target, stage = "persist", path = %self.writer.path().display(), "Writing configuration");
        self.writer.write(&document, sort_keys)?;

        // The file stays on disk when the reload fails; the next successful reload applies it.
        tracing::debug!(section = %target, stage = "reload", "Reloading Prometheus");
        let reload = self.client.reload().await;
        if !reload.success {
            return Err(reload.into_error());
        }

        Ok(OperationResult::success(UPDATED_MESSAGE).with_section(target))
    }
}
