use crate::path::{normalize_index, CompiledPath, ModeTag};
use serde_json::Value;

/// Collect every value addressed by `path`, in document order.
///
/// Missing keys, type mismatches and out-of-range indices simply prune the
/// branch they occur on. An empty path yields the root itself.
pub fn values_at<'a>(root: &'a Value, path: &CompiledPath) -> Vec<&'a Value> {
    if path.is_empty() {
        return vec![root];
    }

    if path.is_plain() {
        return lookup_plain(root, path).into_iter().collect();
    }

    let steps = path.steps();
    let nsteps = steps.len();
    let mut out = Vec::new();
    let mut stack: Vec<(&'a Value, usize)> = vec![(root, 0)];

    while let Some((node, i)) = stack.pop() {
        if i == nsteps {
            out.push(node);
            continue;
        }

        let step = &steps[i];
        let next = i + 1;
        let is_last = next == nsteps;

        let Some(child) = node.as_object().and_then(|obj| obj.get(&*step.key)) else {
            continue;
        };

        match step.tag {
            ModeTag::Dict => stack.push((child, next)),
            ModeTag::All => {
                let Value::Array(items) = child else { continue };
                if is_last {
                    out.extend(items.iter());
                } else {
                    // reversed so the stack pops them left to right
                    stack.extend(items.iter().rev().map(|item| (item, next)));
                }
            }
            ModeTag::Indices => {
                let Value::Array(items) = child else { continue };
                let Some(indices) = step.indices.as_deref() else {
                    continue;
                };
                let picked: Vec<&'a Value> = indices
                    .iter()
                    .filter_map(|&raw| normalize_index(raw, items.len()))
                    .map(|j| &items[j])
                    .collect();
                if is_last {
                    out.extend(picked);
                } else {
                    stack.extend(picked.into_iter().rev().map(|item| (item, next)));
                }
            }
        }
    }

    out
}

fn lookup_plain<'a>(root: &'a Value, path: &CompiledPath) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, step| node.as_object()?.get(&*step.key))
}
