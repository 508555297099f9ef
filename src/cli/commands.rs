//! Command implementations for the spimi binaries.

use std::fs;
use std::path::Path;

use log::info;

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::english::EnglishAnalyzer;
use crate::cli::args::{IndexArgs, LookupArgs};
use crate::cli::output::{IndexBuildResult, LookupResult, output_result};
use crate::error::{Result, SpimiError};
use crate::index::driver::IndexDriver;
use crate::index::reader::IndexReader;

/// Build an index and report its statistics.
pub fn run_index(args: &IndexArgs) -> Result<IndexBuildResult> {
    let input_dir = args.input_dir()?;
    let dictionary = args.dictionary()?;
    let postings = args.postings()?;
    let config = args.spimi_config()?;

    if args.output.verbosity() > 1 {
        println!("Indexing documents from: {}", input_dir.display());
    }
    info!(
        "Building index from {} with blocks of {} documents",
        input_dir.display(),
        config.max_docs_per_block
    );

    let mut driver = IndexDriver::new(config)?;
    let stats = driver.build(input_dir, dictionary, postings)?;

    let result = IndexBuildResult {
        dictionary: dictionary.to_string_lossy().to_string(),
        postings: postings.to_string_lossy().to_string(),
        dictionary_size_bytes: file_size(dictionary)?,
        postings_size_bytes: file_size(postings)?,
        stats,
    };
    output_result("Index built successfully", &result, &args.output)?;

    Ok(result)
}

/// Look up one term and print its postings.
pub fn run_lookup(args: &LookupArgs) -> Result<LookupResult> {
    let term = if args.analyze {
        analyze_term(&args.term)?
    } else {
        args.term.clone()
    };

    let mut reader = IndexReader::open(&args.dictionary, &args.postings)?;
    let result = match reader.lookup(&term)? {
        Some((info, documents)) => LookupResult {
            term,
            found: true,
            doc_frequency: info.doc_frequency,
            documents,
        },
        None => LookupResult {
            term,
            found: false,
            doc_frequency: 0,
            documents: Vec::new(),
        },
    };
    output_result("Lookup complete", &result, &args.output)?;

    Ok(result)
}

/// Normalize a query term the way documents are normalized at index time.
fn analyze_term(raw: &str) -> Result<String> {
    let mut terms = EnglishAnalyzer::new().terms(raw)?;
    match terms.len() {
        1 => Ok(terms.remove(0)),
        0 => Err(SpimiError::analysis(format!(
            "'{raw}' contains no indexable term"
        ))),
        n => Err(SpimiError::analysis(format!(
            "'{raw}' analyzes to {n} terms; look up one term at a time"
        ))),
    }
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_term() {
        assert_eq!(analyze_term("Running").unwrap(), "run");
        assert!(analyze_term("!!").is_err());
        assert!(analyze_term("two words").is_err());
    }
}
