//! Compact, hashable path representation consumed by the extractor hot loop.

use super::{PathStep, StepMode};
use std::sync::Arc;

/// Integer tag for a step kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModeTag {
    Dict = 0,
    All = 1,
    Indices = 2,
}

/// A single compiled step: tag, key, and frozen indices for `Indices` steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledStep {
    pub tag: ModeTag,
    pub key: Box<str>,
    pub indices: Option<Box<[i64]>>,
}

/// An immutable compiled path. Cloning shares the underlying steps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompiledPath {
    steps: Arc<[CompiledStep]>,
    plain: bool,
}

impl CompiledPath {
    pub fn from_steps(steps: &[PathStep]) -> Self {
        let steps: Arc<[CompiledStep]> = steps.iter().map(compile_step).collect();
        let plain = steps.iter().all(|s| s.tag == ModeTag::Dict);
        CompiledPath { steps, plain }
    }

    pub fn steps(&self) -> &[CompiledStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// True when every step is a plain field lookup.
    pub fn is_plain(&self) -> bool {
        self.plain
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledStep> {
        self.steps.iter()
    }
}

fn compile_step(step: &PathStep) -> CompiledStep {
    let (tag, indices) = match &step.mode {
        StepMode::Dict => (ModeTag::Dict, None),
        StepMode::All => (ModeTag::All, None),
        StepMode::Indices(idx) => (ModeTag::Indices, Some(idx.clone().into_boxed_slice())),
    };
    CompiledStep {
        tag,
        key: step.key.as_str().into(),
        indices,
    }
}
