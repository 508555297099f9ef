//! # Spimi
//!
//! Single-pass in-memory inverted index construction with bounded memory.
//!
//! ## Features
//!
//! - Fixed-size document blocks spilled to numbered partial indexes
//! - Pairwise external merge with atomic replacement
//! - Crash-safe publication of the final dictionary and postings files
//! - Pluggable analyzers, postings codecs and scratch storage
//! - Optional parallel block building

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod storage;

pub mod prelude {
    pub use crate::config::SpimiConfig;
    pub use crate::error::{Result, SpimiError};
    pub use crate::index::{BuildStats, IndexDriver, IndexReader};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
