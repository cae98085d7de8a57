//! Recursive structural merge of YAML values.

use serde_yaml::Value;

/// What happens when both sides hold a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMerge {
    /// Payload items are appended after the current items.
    Concat,
    /// The payload sequence replaces the current one.
    Replace,
}

/// Merge `patch` into `base` in place.
///
/// Mappings merge key by key, scalars are overwritten, sequences follow
/// `lists`. A `null` patch leaves `base` untouched at any depth.
pub fn deep_merge(base: &mut Value, patch: Value, lists: ListMerge) {
    match (base, patch) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value, lists),
                    None if value.is_null() => {}
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Sequence(base_items), Value::Sequence(patch_items)) if lists == ListMerge::Concat => {
            base_items.extend(patch_items);
        }
        (base, patch) => *base = patch,
    }
}
