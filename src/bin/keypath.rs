//! keypath: query and edit NDJSON records by key path
//!
//! Usage:
//!   # Print the titles of every post, one array per record
//!   keypath -i 'data/*.jsonl' get 'posts[].title'
//!
//!   # Keep records where every post has a title
//!   cat records.jsonl | keypath has 'posts[].title'
//!
//!   # Drop scratch fields and rename a nested key
//!   keypath -i records.jsonl delete meta.tmp 'items[].debug'
//!   keypath -i records.jsonl rename 'items[].id=item_id'
//!
//!   # Remove records already present in earlier output
//!   keypath -i new.jsonl dedup --key question.id --against 'done/**/*.jsonl'

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use keypath::io::{parse_line, read_jsonl, ReadOptions};
use keypath::{
    delete_by_path, fingerprint, get_values, has_path, rename_by_path, Blacklist, PathCache,
    PathError, SeenKeys,
};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};

#[derive(Parser, Debug)]
#[command(name = "keypath")]
#[command(about = "Query and edit NDJSON records by key path", long_about = None)]
struct Args {
    /// Input file or glob pattern, repeatable (stdin if omitted)
    #[arg(short, long = "input", value_name = "PATTERN", global = true)]
    inputs: Vec<String>,

    /// Output file (stdout if omitted)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Skip malformed input lines without warning
    #[arg(long, global = true)]
    ignore_errors: bool,

    /// Emit the source file path under "##FILEPATH##" in each object record
    #[arg(long, global = true)]
    tag_source: bool,

    /// Log a warning and emit the record with its remaining edits skipped when a
    /// delete/rename path is misused, instead of aborting
    #[arg(long, global = true)]
    skip_invalid: bool,

    /// Log path cache statistics when done
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Emit the values at PATH for each record
    Get {
        path: String,

        /// Emit each value on its own line instead of one array per record
        #[arg(long)]
        flatten: bool,
    },

    /// Keep records where PATH fully exists
    Has {
        path: String,

        /// Keep the records where PATH does not exist instead
        #[arg(long)]
        invert: bool,
    },

    /// Delete every PATH from each record
    Delete {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Rename fields, given as PATH=NEW_KEY
    Rename {
        #[arg(required = true, value_parser = parse_mapping)]
        mappings: Vec<(String, String)>,
    },

    /// Drop records with a duplicate composite key
    Dedup {
        /// Key path, repeatable; together they form the composite key
        #[arg(long = "key", required = true)]
        keys: Vec<String>,

        /// Files whose records are treated as already seen, repeatable
        #[arg(long = "against", value_name = "PATTERN")]
        against: Vec<String>,
    },
}

fn parse_mapping(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.rsplit_once('=') {
        Some((path, key)) if !path.trim().is_empty() && !key.trim().is_empty() => {
            Ok((path.trim().to_string(), key.trim().to_string()))
        }
        _ => Err(format!("expected PATH=NEW_KEY, got {:?}", raw)),
    }
}

/// Per-run state for the selected command
enum Stage {
    Get { path: String, flatten: bool },
    Has { path: String, invert: bool },
    Delete { paths: Vec<String> },
    Rename { mappings: Vec<(String, String)> },
    Interior { seen: SeenKeys },
    Exterior { keys: Vec<String>, blacklist: Blacklist },
}

impl Stage {
    fn from_command(command: Command) -> Result<Self> {
        Ok(match command {
            Command::Get { path, flatten } => Stage::Get { path, flatten },
            Command::Has { path, invert } => Stage::Has { path, invert },
            Command::Delete { paths } => Stage::Delete { paths },
            Command::Rename { mappings } => Stage::Rename { mappings },
            Command::Dedup { keys, against } if against.is_empty() => Stage::Interior {
                seen: SeenKeys::new(keys.as_slice()),
            },
            Command::Dedup { keys, against } => {
                let blacklist = Blacklist::load(against.as_slice(), keys.as_slice())
                    .context("Failed to load dedup keys")?;
                Stage::Exterior { keys, blacklist }
            }
        })
    }

    /// Process one record, returning what to emit.
    fn process(&mut self, mut record: Value, skip_invalid: bool) -> Result<Vec<Value>> {
        match self {
            Stage::Get { path, flatten } => {
                let values: Vec<Value> = get_values(&record, path).into_iter().cloned().collect();
                if *flatten {
                    Ok(values)
                } else {
                    Ok(vec![Value::Array(values)])
                }
            }
            Stage::Has { path, invert } => {
                if has_path(&record, path) != *invert {
                    Ok(vec![record])
                } else {
                    Ok(vec![])
                }
            }
            Stage::Delete { paths } => {
                for path in paths.iter() {
                    let outcome = delete_by_path(&mut record, path);
                    if !check_usage(outcome, skip_invalid)? {
                        break;
                    }
                }
                Ok(vec![record])
            }
            Stage::Rename { mappings } => {
                for (path, new_key) in mappings.iter() {
                    let outcome = rename_by_path(&mut record, path, new_key);
                    if !check_usage(outcome, skip_invalid)? {
                        break;
                    }
                }
                Ok(vec![record])
            }
            Stage::Interior { seen } => {
                if seen.first_seen(&record) {
                    Ok(vec![record])
                } else {
                    Ok(vec![])
                }
            }
            Stage::Exterior { keys, blacklist } => {
                if blacklist.contains(&fingerprint(&record, keys.as_slice())) {
                    Ok(vec![])
                } else {
                    Ok(vec![record])
                }
            }
        }
    }
}

/// Returns whether editing may continue on this record.
fn check_usage(outcome: std::result::Result<(), PathError>, skip_invalid: bool) -> Result<bool> {
    match outcome {
        Ok(()) => Ok(true),
        Err(e) if skip_invalid => {
            log::warn!("remaining edits skipped for record: {}", e);
            Ok(false)
        }
        Err(e) => bail!(e),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let options = ReadOptions {
        ignore_errors: args.ignore_errors,
        tag_source: args.tag_source,
    };

    let records: Box<dyn Iterator<Item = Result<Value>>> = if args.inputs.is_empty() {
        Box::new(stdin_records(args.ignore_errors))
    } else {
        let reader = read_jsonl(args.inputs.as_slice(), options).context("Failed to resolve inputs")?;
        Box::new(reader.map(|r| r.context("Failed to read input")))
    };

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).context(format!("Failed to create output: {}", path))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    };

    let mut stage = Stage::from_command(args.command)?;
    let mut read = 0usize;
    let mut written = 0usize;

    for record in records {
        let record = record?;
        read += 1;
        for value in stage.process(record, args.skip_invalid)? {
            serde_json::to_writer(&mut out, &value).context("Failed to serialize record")?;
            writeln!(out).context("Failed to write record")?;
            written += 1;
        }
    }
    out.flush().context("Failed to flush output")?;

    log::info!("processed {} records, wrote {} lines", read, written);
    if args.stats {
        let stats = serde_json::to_string(&PathCache::global().stats())?;
        log::info!("path cache: {}", stats);
    }

    Ok(())
}

/// Records from stdin, one JSON document per line.
fn stdin_records(ignore_errors: bool) -> impl Iterator<Item = Result<Value>> {
    std::io::stdin()
        .lock()
        .lines()
        .enumerate()
        .filter_map(move |(idx, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(anyhow::Error::new(e).context("Failed to read stdin"))),
            };
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            match parse_line(line) {
                Ok(value) => Some(Ok(value)),
                Err(e) => {
                    if !ignore_errors {
                        log::warn!("skipping malformed JSON [stdin:{}]: {}", idx + 1, e);
                    }
                    None
                }
            }
        })
}
