//! File reading strategies
//!
//! The chunker needs lines with their terminators intact so that the decoded
//! chunks concatenate back to the original text; `BufRead::lines()` strips
//! them, so `LineReader` keeps them. The flattener needs lenient whole-file
//! reads where invalid UTF-8 is replaced instead of failing.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

/// Iterator over the lines of a reader, terminators preserved.
///
/// Each item is the line text including its trailing `\n` (and `\r\n`) when
/// present; the final line of a file without a trailing newline is yielded
/// as-is. An empty source yields nothing.
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        match self.inner.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(line)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Read a whole file, replacing invalid UTF-8 bytes.
///
/// Decoding problems are never fatal here; only opening or reading the file
/// can fail.
pub fn read_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
