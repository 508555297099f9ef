//! Text analysis for Spimi.
//!
//! Analysis turns raw document text into the ordered sequence of normalized
//! terms that the block builder indexes. It is split the usual way:
//!
//! ```text
//! Raw Text → Tokenizer → Filter 1 → ... → Filter N → Terms
//! ```
//!
//! The [`Analyzer`](analyzer::Analyzer) trait is the seam the indexer depends
//! on; [`EnglishAnalyzer`](analyzer::english::EnglishAnalyzer) is the default.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::Analyzer;
pub use token::{Token, TokenStream};
pub use token_filter::Filter;
pub use tokenizer::Tokenizer;
