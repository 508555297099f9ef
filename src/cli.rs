//! Command line interface shared by the `spimi-index` and `spimi-postings` binaries.

pub mod args;
pub mod commands;
pub mod output;

pub use args::{IndexArgs, LookupArgs, OutputArgs, OutputFormat};
pub use commands::{run_index, run_lookup};
pub use output::{IndexBuildResult, LookupResult, output_result};
