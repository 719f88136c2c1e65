use crate::path::{normalize_index, PathStep, StepMode};
use serde_json::Value;

/// Decide whether `steps` fully resolve against `root`.
///
/// Wildcards are universally quantified: `a[].x` exists only if `a` is a
/// non-empty sequence and every element has `x`. An index step requires
/// every requested index to be in range, and an empty index list never
/// exists. This is deliberately stricter than "the path yields a value".
pub fn exists(root: &Value, steps: &[PathStep]) -> bool {
    exists_from(root, steps, 0)
}

fn exists_from(node: &Value, steps: &[PathStep], idx: usize) -> bool {
    let Some(step) = steps.get(idx) else {
        return true;
    };
    let is_last = idx + 1 == steps.len();

    let Some(child) = node.as_object().and_then(|obj| obj.get(&step.key)) else {
        return false;
    };

    match &step.mode {
        StepMode::Dict => exists_from(child, steps, idx + 1),
        StepMode::All => {
            let Value::Array(items) = child else {
                return false;
            };
            if items.is_empty() {
                return false;
            }
            is_last || items.iter().all(|item| exists_from(item, steps, idx + 1))
        }
        StepMode::Indices(indices) => {
            let Value::Array(items) = child else {
                return false;
            };
            if indices.is_empty() {
                return false;
            }
            let mut picked = Vec::with_capacity(indices.len());
            for &raw in indices {
                match normalize_index(raw, items.len()) {
                    Some(j) => picked.push(&items[j]),
                    None => return false,
                }
            }
            is_last || picked.into_iter().all(|item| exists_from(item, steps, idx + 1))
        }
    }
}
