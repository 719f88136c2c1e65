//! Read-only queries: value extraction and existence checks

pub mod exists;
pub mod extract;

pub use exists::exists;
pub use extract::values_at;

use crate::cache::PathCache;
use serde_json::Value;

/// Fetch all values at `path`, using the process-wide path cache.
pub fn get_values<'a>(root: &'a Value, path: &str) -> Vec<&'a Value> {
    PathCache::global().get_values(root, path)
}

/// Check whether `path` fully resolves against `root`, using the process-wide
/// path cache.
pub fn has_path(root: &Value, path: &str) -> bool {
    PathCache::global().has_path(root, path)
}

/// Keep only the records for which [`has_path`] holds.
pub fn filter_has_path<I>(records: I, path: &str) -> impl Iterator<Item = Value>
where
    I: IntoIterator<Item = Value>,
{
    let steps = PathCache::global().parse(path);
    records
        .into_iter()
        .filter(move |record| exists(record, &steps))
}

impl PathCache {
    pub fn get_values<'a>(&self, root: &'a Value, path: &str) -> Vec<&'a Value> {
        values_at(root, &self.compile(path))
    }

    pub fn has_path(&self, root: &Value, path: &str) -> bool {
        exists(root, &self.parse(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_existence_is_stricter_than_extraction() {
        let root = json!({"a": [{"x": 1}, {}]});
        assert!(!has_path(&root, "a[].x"));
        assert_eq!(get_values(&root, "a[].x"), vec![&json!(1)]);
    }

    #[test]
    fn test_filter_has_path() {
        let records = vec![
            json!({"id": 1, "tags": ["a"]}),
            json!({"id": 2, "tags": []}),
            json!({"id": 3}),
        ];
        let kept: Vec<Value> = filter_has_path(records, "tags[]").collect();
        assert_eq!(kept, vec![json!({"id": 1, "tags": ["a"]})]);
    }

    #[test]
    fn test_injected_cache_matches_global() {
        let cache = PathCache::new();
        let root = json!({"a": [10, 20, 30]});
        assert_eq!(cache.get_values(&root, "a[-1,0]"), get_values(&root, "a[-1,0]"));
        assert_eq!(cache.has_path(&root, "a[3]"), has_path(&root, "a[3]"));
    }
}
