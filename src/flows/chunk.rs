//! Token-bounded chunking flow
//!
//! Splits a text file into pieces that each fit a token budget. Lines are
//! the unit of packing: each input line is encoded independently and lines
//! are accumulated greedily until the next one would overflow `max_tokens`,
//! at which point the buffer is decoded and flushed as a chunk.
//!
//! Encoding lines in isolation loses any tokenizer merges that would span a
//! line boundary; every chunk boundary stays on a line boundary.
//!
//! A single line whose tokens alone exceed the budget is emitted as one
//! oversized chunk. Lines are never split below line granularity, and the
//! degenerate case stays visible in the per-chunk token report.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::reader::LineReader;
use crate::core::tokenizer::{count_tokens, Bpe, Encoding, Token, Tokenizer, TokenizerError};

/// Placeholder replaced by the 1-based chunk index in the output pattern
pub const CHUNK_ID_PLACEHOLDER: &str = "{chunk_id}";

/// Errors that abort a chunking run
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("failed to open {}: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to read input: {0}")]
    Read(#[from] io::Error),

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),

    #[error("output pattern `{0}` does not contain the {{chunk_id}} placeholder")]
    InvalidPattern(String),
}

/// Options for the chunk command
#[derive(Debug, Clone)]
pub struct ChunkOptions {
    /// Input text file, read line-by-line
    pub input: PathBuf,
    /// Token budget per chunk (>= 1)
    pub max_tokens: usize,
    /// Output file name pattern containing [`CHUNK_ID_PLACEHOLDER`]
    pub output_pattern: String,
    /// BPE used for encode/decode
    pub encoding: Encoding,
}

/// One completed chunk
#[derive(Debug, Clone)]
pub struct Chunk {
    /// 1-based index, contiguous across the run
    pub index: usize,
    /// The buffered token ids
    pub tokens: Vec<Token>,
    /// The tokens decoded back to text
    pub text: String,
}

/// Chunking run statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkStats {
    pub chunks: usize,
    pub total_tokens: usize,
    pub max_tokens: usize,
    pub oversized_chunks: usize,
    pub encoding: String,
}

/// Lazy iterator over chunks of a line source.
///
/// Nothing beyond the current token buffer is held in memory; the source is
/// pulled one line at a time. Yields `Err` once on the first read or decode
/// failure, then terminates.
pub struct ChunkIter<'a, I, T> {
    lines: I,
    tokenizer: &'a T,
    max_tokens: usize,
    buffer: Vec<Token>,
    next_index: usize,
    done: bool,
}

/// Greedily pack `lines` into token-bounded chunks.
///
/// `lines` must yield line text with terminators preserved so that the
/// concatenation of all chunk token sequences equals the concatenation of
/// the per-line encodings of the input.
pub fn chunk_lines<I, T>(lines: I, max_tokens: usize, tokenizer: &T) -> ChunkIter<'_, I, T>
where
    I: Iterator<Item = io::Result<String>>,
    T: Tokenizer,
{
    debug_assert!(max_tokens > 0);
    ChunkIter {
        lines,
        tokenizer,
        max_tokens,
        buffer: Vec::new(),
        next_index: 1,
        done: false,
    }
}

impl<I, T> ChunkIter<'_, I, T>
where
    T: Tokenizer,
{
    /// Decode and hand out the current buffer, replacing it with the tokens
    /// of the line that triggered the flush (empty at end of input).
    fn flush(&mut self, next_buffer: Vec<Token>) -> Result<Chunk, ChunkError> {
        let tokens = std::mem::replace(&mut self.buffer, next_buffer);
        let text = self.tokenizer.decode(&tokens)?;
        let index = self.next_index;
        self.next_index += 1;
        Ok(Chunk {
            index,
            tokens,
            text,
        })
    }
}

impl<I, T> Iterator for ChunkIter<'_, I, T>
where
    I: Iterator<Item = io::Result<String>>,
    T: Tokenizer,
{
    type Item = Result<Chunk, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.lines.next() {
                Some(Ok(line)) => {
                    let line_tokens = self.tokenizer.encode(&line);
                    if !self.buffer.is_empty()
                        && self.buffer.len() + line_tokens.len() > self.max_tokens
                    {
                        let flushed = self.flush(line_tokens);
                        if flushed.is_err() {
                            self.done = true;
                        }
                        return Some(flushed);
                    }
                    // Fits, or the buffer is empty and this single line
                    // overflows the budget on its own; either way it is
                    // buffered whole.
                    self.buffer.extend(line_tokens);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(ChunkError::Read(e)));
                }
                None => {
                    self.done = true;
                    if self.buffer.is_empty() {
                        return None;
                    }
                    let flushed = self.flush(Vec::new());
                    return Some(flushed);
                }
            }
        }
    }
}

/// Run the chunk command: read the input, write one file per chunk.
///
/// Each output handle is opened, written, and closed before the next chunk
/// is produced. The first error aborts the run; chunks already written stay
/// on disk.
pub fn run_chunk(opts: &ChunkOptions) -> Result<ChunkStats, ChunkError> {
    if !opts.output_pattern.contains(CHUNK_ID_PLACEHOLDER) {
        return Err(ChunkError::InvalidPattern(opts.output_pattern.clone()));
    }

    let tokenizer = Bpe::load(opts.encoding)?;

    let file = File::open(&opts.input).map_err(|e| ChunkError::Open {
        path: opts.input.clone(),
        source: e,
    })?;
    let lines = LineReader::new(BufReader::new(file));

    let mut stats = ChunkStats {
        chunks: 0,
        total_tokens: 0,
        max_tokens: opts.max_tokens,
        oversized_chunks: 0,
        encoding: opts.encoding.to_string(),
    };

    for chunk in chunk_lines(lines, opts.max_tokens, &tokenizer) {
        let chunk = chunk?;
        write_chunk(&chunk, &opts.output_pattern)?;

        // Recount the written text for observability; a failed count is
        // reported, never fatal.
        match count_tokens(&chunk.text, opts.encoding) {
            Some(n) => eprintln!("chunk {} token count: {}", chunk.index, n),
            None => eprintln!("chunk {} token count: undetermined", chunk.index),
        }

        stats.chunks += 1;
        stats.total_tokens += chunk.tokens.len();
        if chunk.tokens.len() > opts.max_tokens {
            stats.oversized_chunks += 1;
        }
    }

    eprintln!(
        "split {} into {} chunks",
        opts.input.display(),
        stats.chunks
    );
    Ok(stats)
}

fn write_chunk(chunk: &Chunk, output_pattern: &str) -> Result<(), ChunkError> {
    let path = PathBuf::from(output_pattern.replace(CHUNK_ID_PLACEHOLDER, &chunk.index.to_string()));
    let write = |path: &PathBuf| -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(chunk.text.as_bytes())?;
        Ok(())
    };
    write(&path).map_err(|e| ChunkError::Write { path, source: e })
}
