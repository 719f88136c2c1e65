//! Line-delimited JSON input and output
//!
//! Inputs are glob patterns. Each pattern resolves to a sorted file list; a
//! pattern that matches nothing is logged and skipped. Blank lines are
//! ignored and malformed lines are logged and skipped, so one bad record never
//! aborts a bulk run.

use crate::error::{LoadError, LoadResult};
use serde_json::Value;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Key under which [`ReadOptions::tag_source`] records the originating file.
pub const SOURCE_KEY: &str = "##FILEPATH##";

/// Options for [`read_jsonl`]
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Skip malformed lines without logging a warning
    pub ignore_errors: bool,

    /// Insert the source file path under [`SOURCE_KEY`] into object records
    pub tag_source: bool,
}

/// Resolve one glob pattern to a sorted list of files.
///
/// Returns an empty list (after logging a warning) when nothing matches.
pub fn resolve_pattern(pattern: &str) -> LoadResult<Vec<PathBuf>> {
    let entries = glob::glob(pattern).map_err(|source| LoadError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        log::warn!("file pattern matched no files: {}", pattern);
    }
    Ok(files)
}

/// Resolve every pattern, keeping each pattern's files sorted and the
/// patterns in the order given.
pub fn resolve_patterns<S: AsRef<str>>(patterns: &[S]) -> LoadResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        files.extend(resolve_pattern(pattern.as_ref())?);
    }
    Ok(files)
}

/// Stream records from every file matched by `patterns`.
pub fn read_jsonl<S: AsRef<str>>(patterns: &[S], options: ReadOptions) -> LoadResult<JsonlReader> {
    let files = resolve_patterns(patterns)?;
    if files.is_empty() {
        log::error!("no input files matched; the record stream will be empty");
    }
    Ok(JsonlReader::new(files, options))
}

/// Iterator over the records of a list of JSONL files.
///
/// I/O failures are yielded as errors; malformed lines are skipped.
#[derive(Debug)]
pub struct JsonlReader {
    pending: VecDeque<PathBuf>,
    current: Option<OpenFile>,
    options: ReadOptions,
}

#[derive(Debug)]
struct OpenFile {
    path: PathBuf,
    reader: BufReader<File>,
    line_num: usize,
    records: usize,
}

impl JsonlReader {
    pub fn new(files: Vec<PathBuf>, options: ReadOptions) -> Self {
        JsonlReader {
            pending: files.into(),
            current: None,
            options,
        }
    }

    fn next_line(&self, file: &mut OpenFile) -> Option<LoadResult<Value>> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match file.reader.read_until(b'\n', &mut buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(LoadError::Io(e))),
            }
            file.line_num += 1;

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }

            match parse_line(line) {
                Ok(mut value) => {
                    if self.options.tag_source {
                        if let Value::Object(obj) = &mut value {
                            obj.insert(
                                SOURCE_KEY.to_string(),
                                Value::String(file.path.to_string_lossy().into_owned()),
                            );
                        }
                    }
                    file.records += 1;
                    return Some(Ok(value));
                }
                Err(e) => {
                    if !self.options.ignore_errors {
                        log::warn!(
                            "skipping malformed JSON [{}:{}]: {}",
                            file.path.display(),
                            file.line_num,
                            e
                        );
                    }
                }
            }
        }
    }
}

impl Iterator for JsonlReader {
    type Item = LoadResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let path = self.pending.pop_front()?;
                match File::open(&path) {
                    Ok(f) => {
                        self.current = Some(OpenFile {
                            path,
                            reader: BufReader::new(f),
                            line_num: 0,
                            records: 0,
                        })
                    }
                    Err(e) => return Some(Err(LoadError::Io(e))),
                }
            }

            let mut file = self.current.take()?;
            match self.next_line(&mut file) {
                Some(item) => {
                    self.current = Some(file);
                    return Some(item);
                }
                None => {
                    log::debug!(
                        "finished reading {} ({} records)",
                        file.path.display(),
                        file.records
                    );
                }
            }
        }
    }
}

/// Parse one JSON document, using the SIMD parser.
pub fn parse_line(line: &str) -> Result<Value, simd_json::Error> {
    let mut bytes = line.as_bytes().to_vec();
    simd_json::serde::from_slice(&mut bytes)
}

/// Write each record as one compact JSON line. Returns the number written.
pub fn write_jsonl<W, I>(mut writer: W, records: I) -> std::io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = Value>,
{
    let mut count = 0;
    for record in records {
        serde_json::to_writer(&mut writer, &record)?;
        writer.write_all(b"\n")?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Create parent directories and write `records` to `path`.
///
/// An existing file is left alone unless `overwrite` is set; the records are
/// then not consumed and `None` is returned. Otherwise returns the number of
/// records written.
pub fn save_jsonl<I>(path: &Path, records: I, overwrite: bool) -> std::io::Result<Option<usize>>
where
    I: IntoIterator<Item = Value>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() && !overwrite {
        log::info!("{} already exists, skipping write (overwrite=false)", path.display());
        return Ok(None);
    }
    let file = std::io::BufWriter::new(File::create(path)?);
    let count = write_jsonl(file, records)?;
    log::info!("saved {} ({} records)", path.display(), count);
    Ok(Some(count))
}
