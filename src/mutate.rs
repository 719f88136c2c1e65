//! In-place structural edits at every location a path addresses
//!
//! Absent keys and shape mismatches are silent no-ops. Walking a plain field
//! step into a sequence that is not the final step is a usage error: the
//! caller has to spell out `key[]` or `key[i]` to edit inside sequences.

use crate::cache::PathCache;
use crate::error::{PathError, PathResult};
use crate::path::{normalize_index, PathStep, StepMode};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Delete every value addressed by `path` from `root`.
///
/// - a final plain field is removed from its map
/// - a final wildcard empties the sequence but keeps the key
/// - a final index list removes those elements
pub fn delete_by_path(root: &mut Value, path: &str) -> PathResult<()> {
    PathCache::global().delete(root, path)
}

/// Rename the final field of `path` to `new_key` wherever it is addressed.
pub fn rename_by_path(root: &mut Value, path: &str, new_key: &str) -> PathResult<()> {
    PathCache::global().rename(root, path, new_key)
}

/// Apply [`delete_by_path`] for every path to each record of a stream.
pub fn delete_fields<'a, I, P>(
    records: I,
    paths: &'a [P],
) -> impl Iterator<Item = PathResult<Value>> + 'a
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: 'a,
    P: AsRef<str>,
{
    records.into_iter().map(move |mut record| {
        for path in paths {
            delete_by_path(&mut record, path.as_ref())?;
        }
        Ok(record)
    })
}

/// Apply [`rename_by_path`] for each `(path, new_key)` pair to each record of
/// a stream. Pairs are applied in order.
pub fn rename_fields<'a, I>(
    records: I,
    mapping: &'a [(String, String)],
) -> impl Iterator<Item = PathResult<Value>> + 'a
where
    I: IntoIterator<Item = Value>,
    I::IntoIter: 'a,
{
    records.into_iter().map(move |mut record| {
        for (path, new_key) in mapping {
            rename_by_path(&mut record, path, new_key)?;
        }
        Ok(record)
    })
}

impl PathCache {
    pub fn delete(&self, root: &mut Value, path: &str) -> PathResult<()> {
        let steps = self.parse(path);
        if steps.is_empty() {
            return Ok(());
        }
        Deleter { path, steps: &steps }.apply(root, 0)
    }

    pub fn rename(&self, root: &mut Value, path: &str, new_key: &str) -> PathResult<()> {
        let steps = self.parse(path);
        let Some(last) = steps.last() else {
            return Ok(());
        };
        if !last.is_dict() {
            return Err(PathError::RenameTargetNotField {
                path: path.to_string(),
            });
        }
        if last.key == new_key {
            return Ok(());
        }
        Renamer {
            path,
            steps: &steps,
            new_key,
        }
        .apply(root, 0)
    }
}

/// Shared descent through a plain field step. Returns the child to recurse
/// into, or `None` when the branch ends silently.
fn descend_field<'v>(
    obj: &'v mut Map<String, Value>,
    path: &str,
    step: &PathStep,
) -> PathResult<Option<&'v mut Value>> {
    match obj.get_mut(&step.key) {
        Some(child) if child.is_array() => Err(PathError::SequenceWithoutSelector {
            path: path.to_string(),
            key: step.key.clone(),
        }),
        Some(child) if child.is_object() => Ok(Some(child)),
        _ => Ok(None),
    }
}

/// Resolve requested indices against a sequence, dropping out-of-range ones.
/// Each element appears once, in the order it was first requested, so the
/// rest of an edit never runs twice on the same element.
fn resolve_indices(indices: &[i64], len: usize) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(indices.len());
    indices
        .iter()
        .filter_map(|&raw| normalize_index(raw, len))
        .filter(|&j| seen.insert(j))
        .collect()
}

struct Deleter<'p> {
    path: &'p str,
    steps: &'p [PathStep],
}

impl Deleter<'_> {
    fn apply(&self, node: &mut Value, idx: usize) -> PathResult<()> {
        let Some(step) = self.steps.get(idx) else {
            return Ok(());
        };
        let is_last = idx + 1 == self.steps.len();
        let Value::Object(obj) = node else {
            return Ok(());
        };

        match &step.mode {
            StepMode::Dict if is_last => {
                obj.shift_remove(&step.key);
                Ok(())
            }
            StepMode::Dict => match descend_field(obj, self.path, step)? {
                Some(child) => self.apply(child, idx + 1),
                None => Ok(()),
            },
            StepMode::All => {
                let Some(Value::Array(items)) = obj.get_mut(&step.key) else {
                    return Ok(());
                };
                if is_last {
                    items.clear();
                    return Ok(());
                }
                items.iter_mut().try_for_each(|item| self.apply(item, idx + 1))
            }
            StepMode::Indices(indices) => {
                let Some(Value::Array(items)) = obj.get_mut(&step.key) else {
                    return Ok(());
                };
                let mut resolved = resolve_indices(indices, items.len());
                if is_last {
                    resolved.sort_unstable();
                    // highest first so earlier positions stay valid
                    for j in resolved.into_iter().rev() {
                        items.remove(j);
                    }
                    return Ok(());
                }
                resolved
                    .into_iter()
                    .try_for_each(|j| self.apply(&mut items[j], idx + 1))
            }
        }
    }
}

struct Renamer<'p> {
    path: &'p str,
    steps: &'p [PathStep],
    new_key: &'p str,
}

impl Renamer<'_> {
    fn apply(&self, node: &mut Value, idx: usize) -> PathResult<()> {
        let Some(step) = self.steps.get(idx) else {
            return Ok(());
        };
        let is_last = idx + 1 == self.steps.len();
        let Value::Object(obj) = node else {
            return Ok(());
        };

        match &step.mode {
            StepMode::Dict if is_last => {
                if let Some(value) = obj.shift_remove(&step.key) {
                    obj.insert(self.new_key.to_string(), value);
                }
                Ok(())
            }
            StepMode::Dict => match descend_field(obj, self.path, step)? {
                Some(child) => self.apply(child, idx + 1),
                None => Ok(()),
            },
            StepMode::All => {
                let Some(Value::Array(items)) = obj.get_mut(&step.key) else {
                    return Ok(());
                };
                items.iter_mut().try_for_each(|item| self.apply(item, idx + 1))
            }
            StepMode::Indices(indices) => {
                let Some(Value::Array(items)) = obj.get_mut(&step.key) else {
                    return Ok(());
                };
                resolve_indices(indices, items.len())
                    .into_iter()
                    .try_for_each(|j| self.apply(&mut items[j], idx + 1))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_delete_plain_field() {
        let mut root = json!({"a": {"b": 1, "c": 2}, "d": 3});
        delete_by_path(&mut root, "a.b").unwrap();
        assert_eq!(root, json!({"a": {"c": 2}, "d": 3}));

        delete_by_path(&mut root, "d").unwrap();
        assert_eq!(root, json!({"a": {"c": 2}}));
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut root = json!({"a": {"b": 1}, "s": "text"});
        let before = root.clone();
        delete_by_path(&mut root, "x.y").unwrap();
        delete_by_path(&mut root, "a.b.c").unwrap();
        delete_by_path(&mut root, "s[]").unwrap();
        delete_by_path(&mut root, "a[0]").unwrap();
        delete_by_path(&mut root, "").unwrap();
        assert_eq!(root, before);
    }

    #[test]
    fn test_delete_terminal_wildcard_clears_sequence() {
        let mut root = json!({"a": [1, 2, 3]});
        delete_by_path(&mut root, "a[]").unwrap();
        assert_eq!(root, json!({"a": []}));
    }

    #[test]
    fn test_delete_through_wildcard() {
        let mut root = json!({"a": [{"x": 1, "y": 2}, {"y": 3}, 7]});
        delete_by_path(&mut root, "a[].x").unwrap();
        assert_eq!(root, json!({"a": [{"y": 2}, {"y": 3}, 7]}));
    }

    #[test]
    fn test_delete_indices_descending_and_deduplicated() {
        let mut root = json!({"a": [0, 1, 2, 3, 4]});
        delete_by_path(&mut root, "a[0,-1,0,9]").unwrap();
        assert_eq!(root, json!({"a": [1, 2, 3]}));
    }

    #[test]
    fn test_delete_through_indices() {
        let mut root = json!({"a": [{"x": 1}, {"x": 2}, {"x": 3}]});
        delete_by_path(&mut root, "a[-1,0,-1].x").unwrap();
        assert_eq!(root, json!({"a": [{}, {"x": 2}, {}]}));
    }

    #[test]
    fn test_delete_through_repeated_index_edits_element_once() {
        let mut root = json!({"a": [{"b": [1, 2, 3]}]});
        delete_by_path(&mut root, "a[0,0].b[0]").unwrap();
        assert_eq!(root, json!({"a": [{"b": [2, 3]}]}));

        // first and last name the same element of a one-element sequence
        let mut root = json!({"a": [{"b": [1, 2, 3]}]});
        delete_by_path(&mut root, "a[0,-1].b[0]").unwrap();
        assert_eq!(root, json!({"a": [{"b": [2, 3]}]}));
    }

    #[test]
    fn test_rename_through_repeated_index() {
        let mut root = json!({"a": [{"x": {"y": 1}}]});
        rename_by_path(&mut root, "a[0,-1,0].x.y", "z").unwrap();
        assert_eq!(root, json!({"a": [{"x": {"z": 1}}]}));
    }

    #[test]
    fn test_delete_through_sequence_without_selector_fails() {
        let mut root = json!({"a": [{"b": 1}]});
        let err = delete_by_path(&mut root, "a.b").unwrap_err();
        assert_eq!(
            err,
            PathError::SequenceWithoutSelector {
                path: "a.b".to_string(),
                key: "a".to_string(),
            }
        );
        assert_eq!(root, json!({"a": [{"b": 1}]}));
    }

    #[test]
    fn test_delete_terminal_sequence_field_is_allowed() {
        let mut root = json!({"a": [1, 2]});
        delete_by_path(&mut root, "a").unwrap();
        assert_eq!(root, json!({}));
    }

    #[test]
    fn test_delete_preserves_key_order() {
        let mut root = json!({"a": 1, "b": 2, "c": 3});
        delete_by_path(&mut root, "a").unwrap();
        let keys: Vec<_> = root.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_rename_plain_field() {
        let mut root = json!({"a": {"b": 1, "c": 2}});
        rename_by_path(&mut root, "a.b", "z").unwrap();
        assert_eq!(root, json!({"a": {"c": 2, "z": 1}}));
        let keys: Vec<_> = root["a"].as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["c", "z"]);
    }

    #[test]
    fn test_rename_overwrites_existing_target() {
        let mut root = json!({"old": 1, "new": 2});
        rename_by_path(&mut root, "old", "new").unwrap();
        assert_eq!(root, json!({"new": 1}));
    }

    #[test]
    fn test_rename_through_wildcard_and_indices() {
        let mut root = json!({"a": [{"x": 1}, {"y": 2}, {"x": 3}]});
        rename_by_path(&mut root, "a[].x", "w").unwrap();
        assert_eq!(root, json!({"a": [{"w": 1}, {"y": 2}, {"w": 3}]}));

        rename_by_path(&mut root, "a[-1].w", "v").unwrap();
        assert_eq!(root, json!({"a": [{"w": 1}, {"y": 2}, {"v": 3}]}));
    }

    #[test]
    fn test_rename_requires_plain_final_step() {
        let mut root = json!({"a": [1]});
        let err = rename_by_path(&mut root, "a[]", "b").unwrap_err();
        assert!(matches!(err, PathError::RenameTargetNotField { .. }));

        let err = rename_by_path(&mut root, "a[0]", "b").unwrap_err();
        assert!(matches!(err, PathError::RenameTargetNotField { .. }));
        assert_eq!(root, json!({"a": [1]}));
    }

    #[test]
    fn test_rename_to_same_key_is_noop() {
        let mut root = json!({"a": [{"b": 1}]});
        // would otherwise trip the sequence guard
        rename_by_path(&mut root, "a.b", "b").unwrap();
        assert_eq!(root, json!({"a": [{"b": 1}]}));
    }

    #[test]
    fn test_rename_through_sequence_without_selector_fails() {
        let mut root = json!({"a": [{"b": 1}]});
        let err = rename_by_path(&mut root, "a.b", "c").unwrap_err();
        assert!(matches!(err, PathError::SequenceWithoutSelector { .. }));
    }

    #[test]
    fn test_stream_adapters() {
        let records = vec![
            json!({"id": 1, "tmp": true, "name": "a"}),
            json!({"id": 2, "name": "b"}),
        ];
        let cleaned: Vec<Value> = delete_fields(records, &["tmp"])
            .collect::<PathResult<_>>()
            .unwrap();
        assert_eq!(cleaned[0], json!({"id": 1, "name": "a"}));

        let mapping = vec![("name".to_string(), "title".to_string())];
        let renamed: Vec<Value> = rename_fields(cleaned, &mapping)
            .collect::<PathResult<_>>()
            .unwrap();
        assert_eq!(renamed[1], json!({"id": 2, "title": "b"}));
    }

    #[test]
    fn test_stream_adapter_reports_usage_error_per_record() {
        let records = vec![json!({"a": {"b": 1}}), json!({"a": [{"b": 1}]})];
        let results: Vec<_> = delete_fields(records, &["a.b"]).collect();
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
