//! Ignore pattern matching
//!
//! Decides whether a relative file path is excluded by a list of shell-glob
//! patterns (`*`, `?`, `[seq]`). Matching is any-match: a path is ignored as
//! soon as one pattern matches it. Pattern order is irrelevant.
//!
//! Patterns come from a plain text file, one pattern per line. Every line is
//! a literal pattern: blank lines and `#` lines get no special treatment, so
//! callers that want comments must pre-filter. A missing ignore file yields
//! an empty list, which ignores nothing.

use glob::Pattern;
use std::fs;
use std::io;
use std::path::Path;

use crate::core::paths::normalize_str;

/// One compiled ignore pattern.
///
/// Separator convention is normalized to '/' at construction, so a pattern
/// written as `build\*` on one platform still matches `build/out.log` on
/// another. A line that does not compile as a glob falls back to literal
/// string equality rather than failing the load.
#[derive(Debug, Clone)]
enum IgnorePattern {
    Glob(Pattern),
    Literal(String),
}

impl IgnorePattern {
    fn new(raw: &str) -> Self {
        let normalized = normalize_str(raw);
        match Pattern::new(&normalized) {
            Ok(pattern) => IgnorePattern::Glob(pattern),
            Err(_) => IgnorePattern::Literal(normalized),
        }
    }

    fn matches(&self, path: &str) -> bool {
        match self {
            // Default match options let '*' and '?' cross '/' boundaries,
            // matching classic fnmatch behavior ("*.log" ignores
            // "build/out.log").
            IgnorePattern::Glob(pattern) => pattern.matches(path),
            IgnorePattern::Literal(literal) => literal == path,
        }
    }
}

/// An ordered list of ignore patterns
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreList {
    /// Build a list from raw pattern strings
    pub fn new<I, S>(raw_patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: raw_patterns
                .into_iter()
                .map(|p| IgnorePattern::new(p.as_ref()))
                .collect(),
        }
    }

    /// Load patterns from a newline-delimited file.
    ///
    /// Lines are trimmed of surrounding whitespace but otherwise kept
    /// verbatim, including empty ones. A missing file yields an empty list.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(Self::new(text.lines().map(str::trim)))
    }

    /// True iff `path` matches at least one pattern
    pub fn is_ignored(&self, path: &str) -> bool {
        let normalized = normalize_str(path);
        self.patterns.iter().any(|p| p.matches(&normalized))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
