//! Repository flattening flow
//!
//! Walks a directory tree, drops files matching the ignore patterns, and
//! concatenates the survivors into one delimited text stream:
//!
//! ```text
//! ----
//! relative/path.rs
//! <contents>
//! ----
//! next/file.md
//! <contents>
//! --END--
//! ```
//!
//! Each record is the delimiter line, the '/'-separated relative path on its
//! own line, then the raw contents followed by one newline. The end marker
//! carries no trailing newline. Entries are walked in file-name order so the
//! output is stable across runs.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::core::ignore::IgnoreList;
use crate::core::paths::make_relative;
use crate::core::reader::read_lossy;

/// Record delimiter line
pub const RECORD_DELIMITER: &str = "----";

/// End-of-stream marker, written without a trailing newline
pub const END_MARKER: &str = "--END--";

/// Options for the flatten command
#[derive(Debug, Clone)]
pub struct FlattenOptions {
    /// Root of the tree to walk
    pub repo_path: PathBuf,
    /// Path of the single output file
    pub output: PathBuf,
    /// Newline-delimited glob patterns; a missing file means nothing is
    /// ignored
    pub ignore_file: PathBuf,
}

/// Flattening run statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlattenStats {
    pub files_written: usize,
    pub files_ignored: usize,
    pub patterns: usize,
}

/// Run the flatten command.
///
/// Per-file decoding problems are replaced, not fatal; walk errors and
/// open/write failures abort the run.
pub fn run_flatten(opts: &FlattenOptions) -> Result<FlattenStats> {
    let ignore = IgnoreList::from_file(&opts.ignore_file).with_context(|| {
        format!(
            "failed to read ignore file {}",
            opts.ignore_file.display()
        )
    })?;

    let output = File::create(&opts.output)
        .with_context(|| format!("failed to create {}", opts.output.display()))?;
    let mut out = BufWriter::new(output);

    let mut stats = FlattenStats {
        patterns: ignore.len(),
        ..Default::default()
    };

    for entry in WalkDir::new(&opts.repo_path).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("failed to walk {}", opts.repo_path.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = make_relative(entry.path(), &opts.repo_path) else {
            continue;
        };
        if ignore.is_ignored(&relative) {
            stats.files_ignored += 1;
            continue;
        }

        let contents = read_lossy(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;

        writeln!(out, "{}", RECORD_DELIMITER)?;
        writeln!(out, "{}", relative)?;
        writeln!(out, "{}", contents)?;
        stats.files_written += 1;
    }

    write!(out, "{}", END_MARKER)?;
    out.flush()
        .with_context(|| format!("failed to write {}", opts.output.display()))?;

    Ok(stats)
}
