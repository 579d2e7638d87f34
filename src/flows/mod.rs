//! Flows module - the two user-facing operations
//!
//! Provides:
//! - flatten: Concatenate a directory tree into one delimited text file
//! - chunk: Split a text file into token-bounded pieces

pub mod chunk;
pub mod flatten;
