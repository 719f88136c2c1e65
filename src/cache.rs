//! Bounded LRU caches for parsed and compiled paths
//!
//! A record stream typically touches a handful of distinct path strings
//! millions of times. [`PathCache`] memoises parsing and compilation per exact
//! input string in two independent stores, each capped by [`CacheConfig`].
//! The stores are guarded by a mutex so worker threads can share one cache.

use crate::path::{parse_uncached, CompiledPath, ParsedPath};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of entries per store.
pub const DEFAULT_CAPACITY: usize = 1024;

static GLOBAL: Lazy<PathCache> = Lazy::new(PathCache::new);

/// Configuration for a [`PathCache`]
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum entries kept in each store (minimum 1)
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Counters for one store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Counters for both stores of a [`PathCache`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub parsed: StoreStats,
    pub compiled: StoreStats,
}

struct Slot<V> {
    value: V,
    last_used: u64,
}

struct Slots<V> {
    map: HashMap<String, Slot<V>>,
    tick: u64,
}

/// A string-keyed store that evicts the least recently used entry once full.
pub struct LruStore<V> {
    capacity: usize,
    slots: Mutex<Slots<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<V: Clone> LruStore<V> {
    pub fn new(capacity: usize) -> Self {
        LruStore {
            capacity: capacity.max(1),
            slots: Mutex::new(Slots {
                map: HashMap::new(),
                tick: 0,
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// `compute` runs without the lock held, so two threads missing on the
    /// same key may both compute it; the first insert wins.
    pub fn get_or_insert_with<F>(&self, key: &str, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(key) {
            return value;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let value = compute();

        let mut slots = self.slots.lock();
        slots.tick += 1;
        let tick = slots.tick;
        if let Some(slot) = slots.map.get_mut(key) {
            slot.last_used = tick;
            return slot.value.clone();
        }
        if slots.map.len() >= self.capacity {
            self.evict_lru(&mut slots);
        }
        slots.map.insert(
            key.to_string(),
            Slot {
                value: value.clone(),
                last_used: tick,
            },
        );
        value
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let mut slots = self.slots.lock();
        slots.tick += 1;
        let tick = slots.tick;
        let slot = slots.map.get_mut(key)?;
        slot.last_used = tick;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(slot.value.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.lock().map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.slots.lock().map.clear();
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    fn evict_lru(&self, slots: &mut Slots<V>) {
        let oldest = slots
            .map
            .iter()
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            slots.map.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Parse and compile caches keyed by the raw path string.
///
/// Syntactically different strings that parse to the same steps get separate
/// entries. Entries are never invalidated, only evicted by capacity.
pub struct PathCache {
    parsed: LruStore<ParsedPath>,
    compiled: LruStore<CompiledPath>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        PathCache {
            parsed: LruStore::new(config.capacity),
            compiled: LruStore::new(config.capacity),
        }
    }

    /// The process-wide cache used by the crate's free functions.
    pub fn global() -> &'static PathCache {
        &GLOBAL
    }

    pub fn parse(&self, path: &str) -> ParsedPath {
        self.parsed
            .get_or_insert_with(path, || parse_uncached(path).into())
    }

    pub fn compile(&self, path: &str) -> CompiledPath {
        self.compiled
            .get_or_insert_with(path, || CompiledPath::from_steps(&self.parse(path)))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            parsed: self.parsed.stats(),
            compiled: self.compiled.stats(),
        }
    }

    /// Drop every cached entry. Counters are kept.
    pub fn clear(&self) {
        self.parsed.clear();
        self.compiled.clear();
    }
}

impl Default for PathCache {
    fn default() -> Self {
        Self::new()
    }
}
