//! Error types for the Spimi library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`SpimiError`] enum. Every error is fatal to the build that raised it:
//! nothing is retried and the publish step never runs after a failure.
//!
//! # Examples
//!
//! ```
//! use spimi::error::{Result, SpimiError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SpimiError::missing_argument("input directory"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for Spimi operations.
#[derive(Error, Debug)]
pub enum SpimiError {
    /// I/O errors outside of document reading and merging.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A corpus document could not be read. Aborts the block and the build.
    #[error("Failed to read document {}: {source}", path.display())]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A required command line parameter was not supplied.
    #[error("Missing argument: {0}")]
    MissingArgument(String),

    /// A merge of two partial indexes failed.
    #[error("Failed to merge partial indexes {left} and {right}: {source}")]
    Merge {
        left: u64,
        right: u64,
        #[source]
        source: Box<SpimiError>,
    },

    /// Encoding or decoding of a dictionary or postings record failed.
    #[error("Codec error: {0}")]
    Codec(String),

    /// Storage-related errors.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Analysis-related errors (tokenization, filtering, etc.).
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An operation was invoked in the wrong build phase.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The build was cancelled before publication.
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with SpimiError.
pub type Result<T> = std::result::Result<T, SpimiError>;

impl SpimiError {
    /// Create a new document read error.
    pub fn document_read<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        SpimiError::DocumentRead {
            path: path.into(),
            source,
        }
    }

    /// Create a new missing argument error.
    pub fn missing_argument<S: Into<String>>(name: S) -> Self {
        SpimiError::MissingArgument(name.into())
    }

    /// Wrap an error raised while merging partial indexes `left` and `right`.
    pub fn merge(left: u64, right: u64, source: SpimiError) -> Self {
        SpimiError::Merge {
            left,
            right,
            source: Box::new(source),
        }
    }

    /// Create a new codec error.
    pub fn codec<S: Into<String>>(msg: S) -> Self {
        SpimiError::Codec(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        SpimiError::Storage(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        SpimiError::Analysis(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        SpimiError::Config(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        SpimiError::InvalidOperation(msg.into())
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        SpimiError::Cancelled(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SpimiError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        SpimiError::Other(format!("Internal error: {}", msg.into()))
    }
}

impl From<bincode::Error> for SpimiError {
    fn from(err: bincode::Error) -> Self {
        SpimiError::Codec(err.to_string())
    }
}
