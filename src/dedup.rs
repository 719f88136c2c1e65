//! Record de-duplication keyed by one or more paths
//!
//! A record's fingerprint has one [`KeyPart`] per key path: `None` when the
//! path yields nothing (or a single `null`), [`KeyPart::Single`] with the
//! compact JSON of the value when it yields one, and [`KeyPart::Many`] with
//! the compact JSON of each value, in order, when it yields several. A single
//! array value and several scalar values therefore never share a fingerprint.

use crate::cache::PathCache;
use crate::error::LoadResult;
use crate::io::{resolve_patterns, JsonlReader, ReadOptions};
use serde_json::Value;
use std::collections::HashSet;

/// Values found at one key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Single(String),
    Many(Vec<String>),
}

/// Hashable identity of a record under a set of key paths.
pub type Fingerprint = Vec<Option<KeyPart>>;

/// Compute the fingerprint of `record` under `key_paths`.
pub fn fingerprint<S: AsRef<str>>(record: &Value, key_paths: &[S]) -> Fingerprint {
    let cache = PathCache::global();
    key_paths
        .iter()
        .map(|path| key_part(&cache.get_values(record, path.as_ref())))
        .collect()
}

fn key_part(values: &[&Value]) -> Option<KeyPart> {
    match values {
        [] | [Value::Null] => None,
        [single] => Some(KeyPart::Single(single.to_string())),
        many => Some(KeyPart::Many(many.iter().map(|v| v.to_string()).collect())),
    }
}

/// Fingerprints seen so far under a fixed set of key paths.
#[derive(Debug, Default)]
pub struct SeenKeys {
    key_paths: Vec<String>,
    seen: HashSet<Fingerprint>,
}

impl SeenKeys {
    pub fn new<S: AsRef<str>>(key_paths: &[S]) -> Self {
        SeenKeys {
            key_paths: owned_paths(key_paths),
            seen: HashSet::new(),
        }
    }

    /// Remember the fingerprint of `record`; true only the first time it
    /// turns up.
    pub fn first_seen(&mut self, record: &Value) -> bool {
        self.seen.insert(fingerprint(record, &self.key_paths))
    }

    /// Number of distinct fingerprints.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Emit each record only the first time its fingerprint is seen.
pub fn dedup_interior<I, S>(records: I, key_paths: &[S]) -> InteriorDedup<I::IntoIter>
where
    I: IntoIterator<Item = Value>,
    S: AsRef<str>,
{
    InteriorDedup {
        inner: records.into_iter(),
        seen: SeenKeys::new(key_paths),
    }
}

/// Iterator returned by [`dedup_interior`]
pub struct InteriorDedup<I> {
    inner: I,
    seen: SeenKeys,
}

impl<I> InteriorDedup<I> {
    /// Number of distinct fingerprints seen so far.
    pub fn distinct(&self) -> usize {
        self.seen.len()
    }
}

impl<I: Iterator<Item = Value>> Iterator for InteriorDedup<I> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let seen = &mut self.seen;
        self.inner.by_ref().find(|record| seen.first_seen(record))
    }
}

/// Fingerprints loaded from existing JSONL files.
#[derive(Debug, Default)]
pub struct Blacklist {
    keys: HashSet<Fingerprint>,
    loaded: usize,
}

impl Blacklist {
    /// Scan every file matched by `patterns` and fingerprint each record.
    ///
    /// Patterns that match nothing are logged and skipped, leaving the
    /// blacklist smaller than intended. Unparsable lines are skipped.
    pub fn load<P, S>(patterns: &[P], key_paths: &[S]) -> LoadResult<Self>
    where
        P: AsRef<str>,
        S: AsRef<str>,
    {
        let mut files = resolve_patterns(patterns)?;
        files.sort();

        if !files.is_empty() {
            log::info!("loading dedup keys from {} files", files.len());
        }

        let options = ReadOptions {
            ignore_errors: true,
            ..ReadOptions::default()
        };
        let mut blacklist = Blacklist::default();
        for record in JsonlReader::new(files, options) {
            blacklist.insert(fingerprint(&record?, key_paths));
        }

        log::info!(
            "dedup keys loaded: {} unique keys from {} records",
            blacklist.len(),
            blacklist.loaded
        );
        Ok(blacklist)
    }

    pub fn insert(&mut self, key: Fingerprint) {
        self.keys.insert(key);
        self.loaded += 1;
    }

    pub fn contains(&self, key: &Fingerprint) -> bool {
        self.keys.contains(key)
    }

    /// Number of unique fingerprints.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of records that contributed a fingerprint.
    pub fn records_loaded(&self) -> usize {
        self.loaded
    }
}

/// Drop records whose fingerprint already appears in the files matched by
/// `patterns`.
pub fn dedup_exterior<I, P, S>(
    records: I,
    patterns: &[P],
    key_paths: &[S],
) -> LoadResult<ExteriorDedup<I::IntoIter>>
where
    I: IntoIterator<Item = Value>,
    P: AsRef<str>,
    S: AsRef<str>,
{
    let blacklist = Blacklist::load(patterns, key_paths)?;
    Ok(ExteriorDedup::new(records, blacklist, key_paths))
}

/// Iterator returned by [`dedup_exterior`]
pub struct ExteriorDedup<I> {
    inner: I,
    key_paths: Vec<String>,
    blacklist: Blacklist,
    kept: usize,
    dropped: usize,
    reported: bool,
}

impl<I> ExteriorDedup<I> {
    pub fn new<R, S>(records: R, blacklist: Blacklist, key_paths: &[S]) -> Self
    where
        R: IntoIterator<IntoIter = I>,
        S: AsRef<str>,
    {
        ExteriorDedup {
            inner: records.into_iter(),
            key_paths: owned_paths(key_paths),
            blacklist,
            kept: 0,
            dropped: 0,
            reported: false,
        }
    }

    pub fn kept(&self) -> usize {
        self.kept
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<I: Iterator<Item = Value>> Iterator for ExteriorDedup<I> {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        for record in self.inner.by_ref() {
            if self.blacklist.contains(&fingerprint(&record, &self.key_paths)) {
                self.dropped += 1;
            } else {
                self.kept += 1;
                return Some(record);
            }
        }
        if !self.reported {
            self.reported = true;
            log::info!(
                "exterior dedup finished: kept {}, dropped {}",
                self.kept,
                self.dropped
            );
        }
        None
    }
}

fn owned_paths<S: AsRef<str>>(paths: &[S]) -> Vec<String> {
    paths.iter().map(|p| p.as_ref().to_string()).collect()
}
