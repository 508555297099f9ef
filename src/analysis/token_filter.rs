//! Token filters transform token streams produced by tokenizers.
//!
//! - [`lowercase::LowercaseFilter`] - Case folding
//! - [`stem::StemFilter`] - Reduces words to their stem form
//!
//! ```text
//! Tokenizer → Lowercase → Stemmer → Index
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
///
/// # Examples
///
/// ```
/// use spimi::analysis::token::{Token, TokenStream};
/// use spimi::analysis::token_filter::Filter;
/// use spimi::error::Result;
///
/// struct ReverseFilter;
///
/// impl Filter for ReverseFilter {
///     fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
///         let reversed: Vec<Token> = tokens
///             .map(|mut t| {
///                 t.text = t.text.chars().rev().collect();
///                 t
///             })
///             .collect();
///         Ok(Box::new(reversed.into_iter()))
///     }
///
///     fn name(&self) -> &'static str {
///         "reverse"
///     }
/// }
/// ```
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter.
    fn name(&self) -> &'static str;
}

pub mod lowercase;
pub mod stem;
