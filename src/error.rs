use thiserror::Error;

/// Convenience result type for path mutations.
pub type PathResult<T> = Result<T, PathError>;

/// Convenience result type for JSONL loading and exterior de-duplication.
pub type LoadResult<T> = Result<T, LoadError>;

/// Usage errors raised by the mutators.
///
/// Missing keys, type mismatches and out-of-range indices are never reported
/// here; they only shrink the set of locations a path addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A plain field step landed on a sequence that is not the last step.
    #[error("path {path:?} reaches a sequence at '.{key}'; write '{key}[]' or '{key}[idx]' to address its elements")]
    SequenceWithoutSelector { path: String, key: String },

    /// The last step of a rename path is a wildcard or an index list.
    #[error("path {path:?} cannot be renamed: the last segment must be a plain field name")]
    RenameTargetNotField { path: String },
}

/// Errors raised while loading line-delimited JSON from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The glob pattern itself is malformed. A pattern that simply matches
    /// nothing is logged, not returned.
    #[error("invalid file pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// A matched directory entry could not be inspected.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),
}
