//! Write-then-stream checkpoints for record pipelines
//!
//! A stage's output is written to a JSONL file once and streamed back from
//! disk, so a rerun can resume from the file instead of recomputing it.
//! Records pass straight through to disk, never buffered in memory.

use crate::error::{LoadError, LoadResult};
use crate::io::{save_jsonl, JsonlReader, ReadOptions};
use serde_json::Value;
use std::path::Path;

/// How [`checkpoint`] treats its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointMode {
    /// Stream the existing file; the producer never runs.
    Read,

    /// Run the producer and save its records, unless the file exists and
    /// `overwrite` is false. Either way, stream from the file afterwards.
    Write { overwrite: bool },

    /// Run the producer for its side effects only; nothing is saved or
    /// streamed back.
    Discard,
}

/// Checkpoint the records of `produce` at `path` according to `mode`.
///
/// In read mode a missing file is an error.
pub fn checkpoint<F, I>(path: &Path, mode: CheckpointMode, produce: F) -> LoadResult<JsonlReader>
where
    F: FnOnce() -> I,
    I: IntoIterator<Item = Value>,
{
    let options = ReadOptions::default();
    match mode {
        CheckpointMode::Read => {
            if !path.exists() {
                log::error!("checkpoint file not found: {}", path.display());
                return Err(LoadError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("checkpoint file not found: {}", path.display()),
                )));
            }
            log::info!("reading checkpoint {}", path.display());
        }
        CheckpointMode::Write { overwrite } => {
            if overwrite || !path.exists() {
                log::info!("running stage, checkpoint goes to {}", path.display());
                save_jsonl(path, produce(), true)?;
            } else {
                log::info!("checkpoint hit, skipping stage: {}", path.display());
            }
        }
        CheckpointMode::Discard => {
            produce().into_iter().for_each(drop);
            return Ok(JsonlReader::new(Vec::new(), options));
        }
    }
    Ok(JsonlReader::new(vec![path.to_path_buf()], options))
}
