use keypath::{
    delete_by_path, get_values, has_path, parse, rename_by_path, to_path_string, CacheConfig,
    PathCache, PathError,
};
use serde_json::{json, Value};

fn owned(values: Vec<&Value>) -> Vec<Value> {
    values.into_iter().cloned().collect()
}

#[test]
fn canonical_form_round_trips() {
    for path in [
        "a.b.c",
        "...a..b",
        " items[] . name ",
        "a[0, 1].b[-1].c[]",
        "a[x,2,,]",
        "a[ ]",
        "[]",
        "",
    ] {
        let steps = parse(path);
        let canonical = to_path_string(&steps);
        assert_eq!(&parse(&canonical)[..], &steps[..], "path {:?}", path);
    }
}

#[test]
fn cold_and_warm_cache_give_identical_results() {
    let cache = PathCache::with_config(CacheConfig { capacity: 4 });
    let root = json!({"a": [{"x": 1}, {"x": [2, 3]}, {"y": 4}]});

    let cold = owned(cache.get_values(&root, "a[].x"));
    let warm = owned(cache.get_values(&root, "a[].x"));
    assert_eq!(cold, warm);
    assert_eq!(cold, vec![json!(1), json!([2, 3])]);
    assert!(cache.stats().compiled.hits >= 1);
}

#[test]
fn results_survive_eviction() {
    let cache = PathCache::with_config(CacheConfig { capacity: 2 });
    let root = json!({"a": {"b": 1}, "c": [1, 2], "d": "x"});

    let before = owned(cache.get_values(&root, "c[-1]"));
    cache.get_values(&root, "a.b");
    cache.get_values(&root, "d");
    cache.get_values(&root, "a");
    let after = owned(cache.get_values(&root, "c[-1]"));

    assert_eq!(before, after);
    assert!(cache.stats().compiled.evictions >= 2);
}

#[test]
fn wildcard_results_preserve_document_order() {
    let root = json!({"a": [{"x": 1}, {"x": 2}, {"x": 3}]});
    assert_eq!(owned(get_values(&root, "a[].x")), vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn index_results_follow_request_order() {
    let root = json!({"a": [10, 20, 30]});
    assert_eq!(owned(get_values(&root, "a[-1,0]")), vec![json!(30), json!(10)]);
}

#[test]
fn existence_is_universal_extraction_is_existential() {
    let root = json!({"a": [{"x": 1}, {}]});
    assert!(!has_path(&root, "a[].x"));
    assert_eq!(owned(get_values(&root, "a[].x")), vec![json!(1)]);
}

#[test]
fn deleting_terminal_wildcard_clears_sequence() {
    let mut root = json!({"a": [1, 2, 3]});
    delete_by_path(&mut root, "a[]").unwrap();
    assert_eq!(root, json!({"a": []}));
}

#[test]
fn deleting_through_sequence_needs_selector() {
    let mut root = json!({"a": [{"b": 1}]});
    let err = delete_by_path(&mut root, "a.b").unwrap_err();
    assert!(matches!(err, PathError::SequenceWithoutSelector { .. }));

    delete_by_path(&mut root, "a[].b").unwrap();
    assert_eq!(root, json!({"a": [{}]}));
}

#[test]
fn repeated_index_deletes_below_it_once() {
    let mut root = json!({"a": [{"b": [1, 2, 3]}], "c": [{"d": [1, 2]}, {"d": [3, 4]}]});
    delete_by_path(&mut root, "a[0,0].b[0]").unwrap();
    delete_by_path(&mut root, "c[1,-1,-2].d[-1]").unwrap();
    assert_eq!(root, json!({"a": [{"b": [2, 3]}], "c": [{"d": [1]}, {"d": [3]}]}));
}

#[test]
fn renaming_wildcard_terminal_is_rejected() {
    let mut root = json!({"a": [1]});
    let err = rename_by_path(&mut root, "a[]", "b").unwrap_err();
    assert!(matches!(err, PathError::RenameTargetNotField { .. }));
}

#[test]
fn renaming_to_same_key_is_noop() {
    let mut root = json!({"a": {"b": 1}});
    rename_by_path(&mut root, "a.b", "b").unwrap();
    assert_eq!(root, json!({"a": {"b": 1}}));
}

#[test]
fn shared_cache_across_threads() {
    let cache = PathCache::with_config(CacheConfig { capacity: 8 });
    let root = json!({"items": [{"id": 1}, {"id": 2}], "meta": {"n": 2}});
    let paths = ["items[].id", "meta.n", "items[-1].id", "items[0,1].id"];

    std::thread::scope(|scope| {
        for t in 0..8 {
            let cache = &cache;
            let root = &root;
            scope.spawn(move || {
                for round in 0..200 {
                    let path = paths[(t + round) % paths.len()];
                    let values = cache.get_values(root, path);
                    assert!(!values.is_empty());
                    assert!(cache.has_path(root, path));
                }
            });
        }
    });

    let stats = cache.stats();
    assert_eq!(stats.compiled.entries, paths.len());
    assert_eq!(stats.parsed.entries, paths.len());
}
