//! CLI module - Command-line interface definitions and handlers

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::tokenizer::Encoding;
use crate::flows::chunk::{run_chunk, ChunkOptions};
use crate::flows::flatten::{run_flatten, FlattenOptions};

/// gptprep - prepare repositories and large texts for LLM-sized contexts.
#[derive(Parser, Debug)]
#[command(name = "gptprep")]
#[command(
    author,
    version,
    about,
    long_about = r#"gptprep has two independent one-shot operations.

flatten walks a directory tree, drops files matching the patterns in an
ignore file, and concatenates the rest into a single delimited text file
suitable for pasting into a prompt.

chunk splits a large text file into pieces that each fit a token budget,
packing whole lines greedily against the budget and writing one output file
per piece.

Progress is reported on stderr; --stats prints a JSON summary on stdout.

Examples:
    gptprep flatten --repo-path . --output repo.txt
    gptprep chunk --input repo.txt --max-tokens 4000 \
        --output-pattern "repo_{chunk_id}.txt"
"#
)]
pub struct Cli {
    /// Print a JSON stats summary on stdout after the run.
    #[arg(
        long,
        global = true,
        long_help = "Print a JSON stats object on stdout after the operation completes.\n\n\
Human-readable progress always goes to stderr, so stdout stays machine-readable."
    )]
    pub stats: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Concatenate a directory tree into one delimited text file.
    #[command(
        long_about = "Walk the tree under --repo-path and write every file that survives the\n\
ignore patterns into --output, each as a record of the form:\n\n\
  ----\n\
  relative/path\n\
  <contents>\n\n\
The stream is terminated by the literal marker --END--. Files are visited in\n\
name order so the output is stable across runs.\n\n\
Examples:\n\
  gptprep flatten --output repo.txt\n\
  gptprep flatten --repo-path ../app --ignore-file .gptignore --output app.txt\n"
    )]
    Flatten {
        /// Root directory to walk.
        #[arg(
            long,
            default_value = ".",
            value_name = "DIR",
            long_help = "Root directory to walk (defaults to the current directory).\n\n\
Paths written to the output are relative to this root, with '/' separators."
        )]
        repo_path: PathBuf,

        /// Output file for the flattened stream.
        #[arg(long, value_name = "FILE")]
        output: PathBuf,

        /// File of ignore patterns, one shell glob per line.
        #[arg(
            long,
            env = "GPTPREP_IGNORE_FILE",
            default_value = ".gptignore",
            value_name = "FILE",
            long_help = "File of ignore patterns, one shell glob (*, ?, [seq]) per line.\n\n\
Every line is a literal pattern; blank lines and # lines are not treated as\n\
comments. A missing file means nothing is ignored."
        )]
        ignore_file: PathBuf,
    },

    /// Split a text file into token-bounded chunks.
    #[command(
        long_about = "Read --input line by line, encode each line with the selected BPE, and\n\
pack whole lines greedily until the next line would push the buffer past\n\
--max-tokens. Each completed chunk is decoded back to text and written to a\n\
file named by --output-pattern with {chunk_id} replaced by the 1-based chunk\n\
number.\n\n\
A single line whose tokens alone exceed the budget is written as one\n\
oversized chunk; lines are never split.\n\n\
Examples:\n\
  gptprep chunk --input repo.txt --max-tokens 4000 \\\n\
      --output-pattern \"repo_{chunk_id}.txt\"\n\
  gptprep chunk --input book.txt --max-tokens 8000 --encoding o200k \\\n\
      --output-pattern \"book.part{chunk_id}\"\n"
    )]
    Chunk {
        /// Input text file, read line by line.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,

        /// Token budget per chunk.
        #[arg(
            long,
            value_name = "N",
            value_parser = clap::value_parser!(u64).range(1..),
            long_help = "Token budget per chunk; must be at least 1.\n\n\
Chunks never exceed this except when a single line alone does."
        )]
        max_tokens: u64,

        /// Output file name pattern containing {chunk_id}.
        #[arg(
            long,
            value_name = "PATTERN",
            long_help = "Output file name pattern. The literal placeholder {chunk_id} is replaced\n\
by the chunk number, starting at 1."
        )]
        output_pattern: String,

        /// Token encoding (cl100k/o200k).
        #[arg(
            long,
            default_value = "cl100k",
            value_name = "NAME",
            long_help = "BPE used to encode and decode: cl100k (default) or o200k.\n\n\
The heuristic encoding only estimates counts and cannot chunk."
        )]
        encoding: String,
    },
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Flatten {
            repo_path,
            output,
            ignore_file,
        } => {
            let opts = FlattenOptions {
                repo_path,
                output,
                ignore_file,
            };
            let flatten_stats = run_flatten(&opts)?;
            eprintln!("repository contents written to {}", opts.output.display());
            if cli.stats {
                println!("{}", serde_json::to_string(&flatten_stats)?);
            }
            Ok(())
        }

        Commands::Chunk {
            input,
            max_tokens,
            output_pattern,
            encoding,
        } => {
            let encoding: Encoding = encoding.parse().map_err(anyhow::Error::msg)?;
            let opts = ChunkOptions {
                input,
                max_tokens: max_tokens as usize,
                output_pattern,
                encoding,
            };
            let chunk_stats = run_chunk(&opts)?;
            if cli.stats {
                println!("{}", serde_json::to_string(&chunk_stats)?);
            }
            Ok(())
        }
    }
}
