//! # Keypath - addressing values inside nested JSON records
//!
//! A small path language for reading and editing values in trees of maps,
//! sequences and scalars, as produced by decoding line-delimited JSON.
//!
//! ## Path grammar
//!
//! - `a.b` follows plain fields
//! - `a[]` addresses every element of the sequence under `a`
//! - `a[0,-1]` addresses selected elements, negative indices counting from the end
//!
//! Leading dots and empty segments are ignored; the empty path is the root.
//!
//! ## Modules
//!
//! - **path**: parsing and compilation of path expressions
//! - **cache**: bounded LRU caches for parsed and compiled paths
//! - **query**: value extraction and existence checks
//! - **mutate**: in-place delete and rename
//! - **dedup**: fingerprinting and record de-duplication
//! - **io**: JSONL readers and writers
//! - **checkpoint**: write-then-stream checkpoints of record stages
//!
//! ## Quick Start
//!
//! ```rust
//! use keypath::{delete_by_path, get_values, has_path, rename_by_path};
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut record = json!({
//!     "id": 1,
//!     "posts": [
//!         {"id": 10, "title": "First Post"},
//!         {"id": 11}
//!     ]
//! });
//!
//! // collects whatever is present
//! assert_eq!(get_values(&record, "posts[].title"), vec![&json!("First Post")]);
//! // but only "exists" if every post has a title
//! assert!(!has_path(&record, "posts[].title"));
//!
//! rename_by_path(&mut record, "posts[].id", "post_id")?;
//! delete_by_path(&mut record, "posts[-1]")?;
//! assert_eq!(record, json!({"id": 1, "posts": [{"post_id": 10, "title": "First Post"}]}));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod checkpoint;
pub mod dedup;
pub mod error;
pub mod io;
pub mod mutate;
pub mod path;
pub mod query;

// Re-export commonly used types for convenience
pub use cache::{CacheConfig, CacheStats, PathCache};
pub use checkpoint::{checkpoint, CheckpointMode};
pub use dedup::{
    dedup_exterior, dedup_interior, fingerprint, Blacklist, Fingerprint, KeyPart, SeenKeys,
};
pub use error::{LoadError, LoadResult, PathError, PathResult};
pub use io::{read_jsonl, write_jsonl, ReadOptions};
pub use mutate::{delete_by_path, delete_fields, rename_by_path, rename_fields};
pub use path::{to_path_string, CompiledPath, ModeTag, ParsedPath, PathStep, StepMode};
pub use query::{filter_has_path, get_values, has_path};

/// Parse `path` through the process-wide cache.
pub fn parse(path: &str) -> ParsedPath {
    PathCache::global().parse(path)
}

/// Compile `path` through the process-wide cache.
pub fn compile(path: &str) -> CompiledPath {
    PathCache::global().compile(path)
}
