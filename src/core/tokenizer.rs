//! Tokenizer adapter and token counting
//!
//! The chunker only needs two capabilities from a tokenizer: `encode` text
//! into token ids and `decode` ids back into text. Those live behind the
//! [`Tokenizer`] trait so any BPE (or a test double) can satisfy it; the
//! shipped implementation wraps tiktoken's `cl100k_base` and `o200k_base`
//! encodings, loaded lazily once per process.
//!
//! Independently of encode/decode, [`count_tokens`] recounts finished output
//! for reporting. When the BPE cannot be loaded the count degrades to `None`
//! ("undetermined") instead of failing; the `heuristic` encoding estimates
//! without any BPE at all.

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

/// A token id produced by a tokenizer's encode step
pub type Token = u32;

/// Errors from the tokenizer seam
#[derive(Debug, Error)]
pub enum TokenizerError {
    #[error("encoding {0} is unavailable: {1}")]
    Unavailable(Encoding, String),
    #[error("token decode failed: {0}")]
    Decode(String),
}

/// The black-box tokenizer capability the chunker depends on
pub trait Tokenizer {
    /// Encode text into a sequence of token ids
    fn encode(&self, text: &str) -> Vec<Token>;

    /// Decode a sequence of token ids back into text
    fn decode(&self, tokens: &[Token]) -> Result<String, TokenizerError>;
}

/// Supported token encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// cl100k_base (GPT-4, GPT-3.5-turbo; a fair approximation for Claude)
    #[default]
    Cl100k,
    /// o200k_base (GPT-4o native)
    O200k,
    /// Estimation only, no BPE; cannot encode or decode
    Heuristic,
}

impl Encoding {
    fn bpe(&self) -> Option<&'static Result<CoreBPE, String>> {
        match self {
            Encoding::Cl100k => Some(&CL100K_BPE),
            Encoding::O200k => Some(&O200K_BPE),
            Encoding::Heuristic => None,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Cl100k => "cl100k",
            Encoding::O200k => "o200k",
            Encoding::Heuristic => "heuristic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" | "default" => Ok(Encoding::Cl100k),
            "o200k" | "o200k_base" => Ok(Encoding::O200k),
            "heuristic" | "estimate" => Ok(Encoding::Heuristic),
            _ => Err(format!(
                "unknown encoding: {} (available: cl100k, o200k, heuristic)",
                s
            )),
        }
    }
}

// BPE tables are loaded once on first use and shared for the process.
static CL100K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| e.to_string()));

static O200K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| e.to_string()));

/// Tiktoken-backed [`Tokenizer`]
pub struct Bpe {
    bpe: &'static CoreBPE,
}

impl Bpe {
    /// Load the BPE for an encoding.
    ///
    /// Fails for [`Encoding::Heuristic`] (it has no encode/decode) and when
    /// the BPE table itself cannot be initialized.
    pub fn load(encoding: Encoding) -> Result<Self, TokenizerError> {
        let slot = encoding.bpe().ok_or_else(|| {
            TokenizerError::Unavailable(encoding, "estimation-only encoding".to_string())
        })?;
        match slot {
            Ok(bpe) => Ok(Self { bpe }),
            Err(e) => Err(TokenizerError::Unavailable(encoding, e.clone())),
        }
    }
}

impl Tokenizer for Bpe {
    fn encode(&self, text: &str) -> Vec<Token> {
        // no special tokens: each line is ordinary text
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[Token]) -> Result<String, TokenizerError> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| TokenizerError::Decode(e.to_string()))
    }
}

/// Count tokens in text with the given encoding.
///
/// Returns `None` when the encoding's BPE cannot be loaded; callers report
/// that as an undetermined count rather than an error.
pub fn count_tokens(text: &str, encoding: Encoding) -> Option<usize> {
    if text.is_empty() {
        return Some(0);
    }
    match encoding {
        Encoding::Heuristic => Some(estimate_tokens(text)),
        _ => match encoding.bpe()? {
            Ok(bpe) => Some(bpe.encode_ordinary(text).len()),
            Err(_) => None,
        },
    }
}

/// Estimate a token count without running a BPE.
///
/// Density per character class roughly follows GPT-family tokenizers:
/// alphanumeric ASCII packs ~4 chars into a token, punctuation ~2, CJK ~1.5,
/// other non-ASCII ~2.
pub fn estimate_tokens(text: &str) -> usize {
    let mut alnum = 0usize;
    let mut punct = 0usize;
    let mut cjk = 0usize;
    let mut other = 0usize;

    for c in text.chars() {
        if c.is_ascii() {
            if c.is_ascii_alphanumeric() || c.is_ascii_whitespace() {
                alnum += 1;
            } else {
                punct += 1;
            }
        } else if is_cjk(c) {
            cjk += 1;
        } else {
            other += 1;
        }
    }

    alnum.div_ceil(4) + punct.div_ceil(2) + (cjk * 2).div_ceil(3) + other.div_ceil(2)
}

#[inline]
fn is_cjk(c: char) -> bool {
    let cp = c as u32;
    (0x4E00..=0x9FFF).contains(&cp)      // CJK Unified Ideographs
        || (0x3400..=0x4DBF).contains(&cp)  // CJK Extension A
        || (0x3000..=0x30FF).contains(&cp)  // CJK punctuation, kana
        || (0xAC00..=0xD7AF).contains(&cp)  // Hangul Syllables
        || (0xFF00..=0xFFEF).contains(&cp) // Fullwidth Forms
}
