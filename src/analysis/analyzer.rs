//! Analyzers: complete text-to-terms pipelines.
//!
//! The block builder depends only on the [`Analyzer`] trait, so the term
//! extraction strategy can be swapped without touching the indexer.
//!
//! - [`PipelineAnalyzer`](pipeline::PipelineAnalyzer) - Tokenizer + filter chain
//! - [`EnglishAnalyzer`](english::EnglishAnalyzer) - Default term extractor
//!
//! # Examples
//!
//! ```
//! use spimi::analysis::analyzer::Analyzer;
//! use spimi::analysis::analyzer::english::EnglishAnalyzer;
//!
//! let analyzer = EnglishAnalyzer::new();
//! let terms = analyzer.terms("Cats are running!").unwrap();
//! assert_eq!(terms, vec!["cat", "ar", "run"]);
//! ```

use std::sync::Arc;

use crate::analysis::token::TokenStream;
use crate::error::Result;

pub mod english;
pub mod pipeline;

/// Trait for analyzers that convert text into processed tokens.
///
/// `Send + Sync` is required so that one analyzer can be shared by the
/// block-building workers.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and configuration).
    fn name(&self) -> &'static str;

    /// Analyze the text and return the surviving terms in order.
    fn terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self
            .analyze(text)?
            .filter(|token| !token.is_empty())
            .map(|token| token.text)
            .collect())
    }
}

impl<A: Analyzer + ?Sized> Analyzer for Arc<A> {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        (**self).analyze(text)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
