//! In-memory form of the Prometheus configuration file.
//!
//! The document keeps its top-level sections as opaque YAML values. Field
//! catalogues of the individual sections belong to Prometheus itself; the
//! sidecar only needs to know each section's shape to merge it.

use std::fmt;
use std::str::FromStr;

use serde_yaml::{Mapping, Value};

use crate::merge::MergePolicy;

/// A named top-level section of the Prometheus configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Global,
    Runtime,
    RuleFiles,
    ScrapeConfigFiles,
    ScrapeConfigs,
    Alerting,
    RemoteWrite,
    RemoteRead,
    Storage,
    Tracing,
}

impl Section {
    /// Every section, in the order Prometheus documents them.
    pub const ALL: [Section; 10] = [
        Section::Global,
        Section::Runtime,
        Section::RuleFiles,
        Section::ScrapeConfigFiles,
        Section::ScrapeConfigs,
        Section::Alerting,
        Section::RemoteWrite,
        Section::RemoteRead,
        Section::Storage,
        Section::Tracing,
    ];

    /// The YAML key of this section.
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Global => "global",
            Section::Runtime => "runtime",
            Section::RuleFiles => "rule_files",
            Section::ScrapeConfigFiles => "scrape_config_files",
            Section::ScrapeConfigs => "scrape_configs",
            Section::Alerting => "alerting",
            Section::RemoteWrite => "remote_write",
            Section::RemoteRead => "remote_read",
            Section::Storage => "storage",
            Section::Tracing => "tracing",
        }
    }

    /// Merge policy declared for this section.
    pub fn policy(self) -> MergePolicy {
        match self {
            Section::Global | Section::Runtime => MergePolicy::Overlay,
            Section::Alerting | Section::Storage | Section::Tracing => MergePolicy::DeepOverlay,
            Section::RuleFiles | Section::ScrapeConfigFiles => MergePolicy::AppendDedupSet,
            Section::ScrapeConfigs => MergePolicy::MergeByKey { key: "job_name" },
            Section::RemoteWrite | Section::RemoteRead => MergePolicy::Replace,
        }
    }

    /// Whether the section is a YAML sequence rather than a mapping.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            Section::RuleFiles
                | Section::ScrapeConfigFiles
                | Section::ScrapeConfigs
                | Section::RemoteWrite
                | Section::RemoteRead
        )
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown section name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown configuration section '{0}'")]
pub struct UnknownSection(pub String);

impl FromStr for Section {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// The full live configuration, keyed by section name.
///
/// Keys outside the known sections are carried through untouched so a
/// rewrite never drops configuration the sidecar does not understand.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Mapping,
}

impl ConfigDocument {
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    /// Parse configuration text. An empty document yields an empty mapping.
    pub fn from_yaml(text: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_yaml::from_str(text)?;
        match value {
            Value::Mapping(root) => Ok(Self { root }),
            Value::Null => Ok(Self::default()),
            _ => Err(DocumentError::NotAMapping),
        }
    }

    pub fn section(&self, section: Section) -> Option<&Value> {
        self.root.get(section.as_str())
    }

    /// Replace a section's value, keeping its position when it already exists.
    pub fn set_section(&mut self, section: Section, value: Value) {
        self.root.insert(Value::from(section.as_str()), value);
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.root
    }

    pub fn into_mapping(self) -> Mapping {
        self.root
    }

    /// Serialize to the on-disk text form.
    ///
    /// Key order follows the document unless `sort_keys` is set, in which
    /// case every mapping at every depth is ordered alphabetically.
    pub fn to_yaml(&self, sort_keys: bool) -> Result<String, DocumentError> {
        let root = Value::Mapping(self.root.clone());
        let root = if sort_keys { sorted(root) } else { root };
        Ok(serde_yaml::to_string(&root)?)
    }
}

/// Errors produced while converting between text and [`ConfigDocument`].
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("configuration root is not a mapping")]
    NotAMapping,
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut entries: Vec<(Value, Value)> = map.into_iter().collect();
            entries.sort_by_key(|(key, _)| sort_key(key));
            Value::Mapping(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, sorted(value)))
                    .collect(),
            )
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

fn sort_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other).unwrap_or_default(),
    }
}
