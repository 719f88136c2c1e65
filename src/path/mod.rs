//! Key-path expressions
//!
//! A key path addresses values inside a nested JSON record:
//!
//! - `a.b` descends through plain fields
//! - `a[]` visits every element of the sequence stored under `a`
//! - `a[0,-1]` visits selected elements, negative indices counting from the end
//!
//! Parsing and compilation are pure; the [`crate::cache::PathCache`] memoises
//! both per exact input string.

pub mod compiled;
pub mod parser;

pub use compiled::{CompiledPath, CompiledStep, ModeTag};
pub use parser::parse_uncached;

use std::fmt;
use std::sync::Arc;

/// A parsed path, shared between the cache and its callers.
pub type ParsedPath = Arc<[PathStep]>;

/// How a step addresses the value stored under its key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepMode {
    /// Descend into `node[key]`.
    Dict,
    /// Every element of the sequence at `node[key]`.
    All,
    /// Selected elements of the sequence at `node[key]`, in request order.
    Indices(Vec<i64>),
}

/// One dot-separated segment of a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathStep {
    pub key: String,
    pub mode: StepMode,
}

impl PathStep {
    pub fn dict(key: impl Into<String>) -> Self {
        PathStep {
            key: key.into(),
            mode: StepMode::Dict,
        }
    }

    pub fn all(key: impl Into<String>) -> Self {
        PathStep {
            key: key.into(),
            mode: StepMode::All,
        }
    }

    pub fn indices(key: impl Into<String>, indices: Vec<i64>) -> Self {
        PathStep {
            key: key.into(),
            mode: StepMode::Indices(indices),
        }
    }

    pub fn is_dict(&self) -> bool {
        matches!(self.mode, StepMode::Dict)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mode {
            StepMode::Dict => write!(f, "{}", self.key),
            StepMode::All => write!(f, "{}[]", self.key),
            // `key[]` would read back as a wildcard
            StepMode::Indices(indices) if indices.is_empty() => write!(f, "{}[,]", self.key),
            StepMode::Indices(indices) => {
                write!(f, "{}[", self.key)?;
                for (i, idx) in indices.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", idx)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Render steps back into a path expression that parses to the same steps.
pub fn to_path_string(steps: &[PathStep]) -> String {
    steps
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Resolve a possibly negative index against a sequence of length `len`.
pub(crate) fn normalize_index(raw: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let idx = if raw < 0 { len + raw } else { raw };
    if (0..len).contains(&idx) {
        Some(idx as usize)
    } else {
        None
    }
}
