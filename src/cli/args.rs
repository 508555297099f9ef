//! Command line argument parsing for the spimi binaries using clap.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::SpimiConfig;
use crate::error::{Result, SpimiError};

/// Build an inverted index from a directory of documents
#[derive(Parser, Debug, Clone)]
#[command(name = "spimi-index")]
#[command(about = "Build an inverted index from a directory of documents")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct IndexArgs {
    /// Directory containing one file per document
    #[arg(short = 'i', long = "input-dir", env = "SPIMI_INPUT_DIR", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Output dictionary file
    #[arg(short = 'd', long = "dictionary", env = "SPIMI_DICTIONARY", value_name = "FILE")]
    pub dictionary: Option<PathBuf>,

    /// Output postings file
    #[arg(short = 'p', long = "postings", env = "SPIMI_POSTINGS", value_name = "FILE")]
    pub postings: Option<PathBuf>,

    /// Maximum documents per in-memory block [default: 2500]
    #[arg(short = 'b', long = "block-size", value_name = "N")]
    pub block_size: Option<usize>,

    /// Scratch directory for partial indexes [default: _temp_spimi]
    #[arg(long = "temp-dir", value_name = "DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Worker threads for block building (0 = one per CPU)
    #[arg(short = 't', long, value_name = "N")]
    pub threads: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl IndexArgs {
    pub fn input_dir(&self) -> Result<&Path> {
        required(&self.input_dir, "-i/--input-dir (or SPIMI_INPUT_DIR)")
    }

    pub fn dictionary(&self) -> Result<&Path> {
        required(&self.dictionary, "-d/--dictionary (or SPIMI_DICTIONARY)")
    }

    pub fn postings(&self) -> Result<&Path> {
        required(&self.postings, "-p/--postings (or SPIMI_POSTINGS)")
    }

    /// Resolve the build configuration: file (if any), then flag overrides.
    pub fn spimi_config(&self) -> Result<SpimiConfig> {
        let mut config = match &self.config {
            Some(path) => SpimiConfig::from_json_file(path)?,
            None => SpimiConfig::default(),
        };

        if let Some(block_size) = self.block_size {
            config = config.with_max_docs_per_block(block_size);
        }
        if let Some(temp_dir) = &self.temp_dir {
            config = config.with_temp_dir(temp_dir);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }

        config.validate()?;
        Ok(config)
    }
}

/// Look up a term's postings in a built index
#[derive(Parser, Debug, Clone)]
#[command(name = "spimi-postings")]
#[command(about = "Look up a term's postings in a built index")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct LookupArgs {
    /// Dictionary file
    #[arg(short = 'd', long = "dictionary", env = "SPIMI_DICTIONARY", value_name = "FILE")]
    pub dictionary: PathBuf,

    /// Postings file
    #[arg(short = 'p', long = "postings", env = "SPIMI_POSTINGS", value_name = "FILE")]
    pub postings: PathBuf,

    /// Term to look up
    #[arg(value_name = "TERM")]
    pub term: String,

    /// Normalize the term with the indexing analyzer first
    #[arg(short, long)]
    pub analyze: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Flags shared by both binaries.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl OutputArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn required<'a>(value: &'a Option<PathBuf>, name: &str) -> Result<&'a Path> {
    value
        .as_deref()
        .ok_or_else(|| SpimiError::missing_argument(name))
}
