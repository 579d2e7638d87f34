//! gptprep - prepare repositories and large texts for LLM-sized contexts
//!
//! gptprep provides:
//! - flatten: concatenate a directory tree into one delimited text file,
//!   filtered by shell-glob ignore patterns
//! - chunk: split a text file into token-bounded pieces using a BPE
//!   encode/decode round-trip

use anyhow::Result;
use clap::Parser;

mod cli;
mod core;
mod flows;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::run(cli)
}
