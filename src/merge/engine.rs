//! Policy dispatch for section updates.

use serde_yaml::{Mapping, Value};

use super::deep::{deep_merge, ListMerge};
use super::{MergeError, MergePolicy};
use crate::prometheus::Section;

/// Combine `patch` with the current value of `section`.
///
/// `current` is `None` when the section is absent from the document.
pub fn merge(section: Section, current: Option<Value>, patch: Value) -> Result<Value, MergeError> {
    match section.policy() {
        MergePolicy::Replace => Ok(patch),
        MergePolicy::Overlay => overlay(section, current, patch),
        MergePolicy::DeepOverlay => {
            let patch = expect_mapping(section, patch)?;
            let mut base = Value::Mapping(current_mapping(section, current)?);
            deep_merge(&mut base, Value::Mapping(patch), ListMerge::Replace);
            Ok(base)
        }
        MergePolicy::AppendDedupSet => {
            let mut items = current_sequence(section, current)?;
            for value in expect_scalars(section, patch)? {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            Ok(Value::Sequence(items))
        }
        MergePolicy::MergeByKey { key } => merge_by_key(section, key, current, patch),
    }
}

/// Remove `values` from a set-shaped section. Values that are not members are ignored.
pub fn remove_values(
    section: Section,
    current: Option<Value>,
    values: Value,
) -> Result<Value, MergeError> {
    if section.policy() != MergePolicy::AppendDedupSet {
        return Err(MergeError::Unsupported {
            section,
            operation: "removing values",
        });
    }
    let removed = expect_scalars(section, values)?;
    let mut items = current_sequence(section, current)?;
    items.retain(|item| !removed.contains(item));
    Ok(Value::Sequence(items))
}

/// Remove exactly one entry identified by its key from a keyed section.
///
/// Only the first matching entry is removed.
pub fn remove_entry(
    section: Section,
    current: Option<Value>,
    key_value: &str,
) -> Result<Value, MergeError> {
    let MergePolicy::MergeByKey { key } = section.policy() else {
        return Err(MergeError::Unsupported {
            section,
            operation: "removing entries by key",
        });
    };

    let mut items = current_sequence(section, current)?;
    let position = items
        .iter()
        .position(|entry| entry_key(entry, key) == Some(key_value))
        .ok_or_else(|| MergeError::NotFound {
            section,
            key: key_value.to_string(),
        })?;
    items.remove(position);
    Ok(Value::Sequence(items))
}

fn overlay(section: Section, current: Option<Value>, patch: Value) -> Result<Value, MergeError> {
    let patch = expect_mapping(section, patch)?;
    let mut base = current_mapping(section, current)?;
    for (field, value) in patch {
        if !value.is_null() {
            base.insert(field, value);
        }
    }
    Ok(Value::Mapping(base))
}

fn merge_by_key(
    section: Section,
    key: &'static str,
    current: Option<Value>,
    patch: Value,
) -> Result<Value, MergeError> {
    let mut items = current_sequence(section, current)?;
    let Value::Sequence(entries) = patch else {
        return Err(MergeError::ShapeMismatch {
            section,
            expected: "a list of keyed entries",
        });
    };

    for entry in entries {
        let name = entry_key(&entry, key)
            .ok_or(MergeError::ShapeMismatch {
                section,
                expected: "every entry to carry its key field",
            })?
            .to_string();

        match items
            .iter_mut()
            .find(|existing| entry_key(existing, key) == Some(name.as_str()))
        {
            Some(existing) => deep_merge(existing, entry, ListMerge::Concat),
            None => items.push(entry),
        }
    }
    Ok(Value::Sequence(items))
}

fn entry_key<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}

fn expect_mapping(section: Section, patch: Value) -> Result<Mapping, MergeError> {
    match patch {
        Value::Mapping(map) => Ok(map),
        _ => Err(MergeError::ShapeMismatch {
            section,
            expected: "an object",
        }),
    }
}

fn expect_scalars(section: Section, patch: Value) -> Result<Vec<Value>, MergeError> {
    let mismatch = MergeError::ShapeMismatch {
        section,
        expected: "a list of strings",
    };
    let Value::Sequence(items) = patch else {
        return Err(mismatch);
    };
    if items.iter().all(Value::is_string) {
        Ok(items)
    } else {
        Err(mismatch)
    }
}

fn current_mapping(section: Section, current: Option<Value>) -> Result<Mapping, MergeError> {
    match current {
        None | Some(Value::Null) => Ok(Mapping::new()),
        Some(Value::Mapping(map)) => Ok(map),
        Some(_) => Err(MergeError::ShapeMismatch {
            section,
            expected: "an object in the current configuration",
        }),
    }
}

fn current_sequence(section: Section, current: Option<Value>) -> Result<Vec<Value>, MergeError> {
    match current {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => Ok(items),
        Some(_) => Err(MergeError::ShapeMismatch {
            section,
            expected: "a list in the current configuration",
        }),
    }
}
