//! Storage abstraction for partial index files.
//!
//! The indexer never touches the scratch directory through `std::fs`
//! directly; it goes through the [`Storage`] trait so that file naming,
//! buffering, and durability are decided in one place.
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//!
//! use spimi::storage::file::FileStorage;
//! use spimi::storage::{Storage, StorageConfig};
//!
//! # fn main() -> spimi::error::Result<()> {
//! let dir = tempfile::TempDir::new()?;
//! let storage = FileStorage::new(dir.path(), StorageConfig::default())?;
//!
//! let mut output = storage.create_output("1.post")?;
//! output.write_all(b"postings")?;
//! output.close()?;
//!
//! let mut input = storage.open_input("1.post")?;
//! let mut buffer = Vec::new();
//! input.read_to_end(&mut buffer)?;
//! assert_eq!(buffer, b"postings");
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod file;

/// A trait for storage backends holding named files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create a file for writing, truncating any existing content.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Create a uniquely named temporary file. Returns its name and writer.
    fn create_temp_output(&self, prefix: &str) -> Result<(String, Box<dyn StorageOutput>)>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all files, sorted by name.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Get the size of a file in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;

    /// Atomically rename a file, replacing any existing file at `new_name`.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Delete every file in the storage.
    fn clear(&self) -> Result<()>;

    /// Make completed renames and deletions durable.
    fn sync(&self) -> Result<()>;
}

/// A readable, seekable file handle.
pub trait StorageInput: Read + Seek + Send + std::fmt::Debug {
    /// Total size of the file in bytes.
    fn size(&self) -> Result<u64>;
}

/// A writable file handle that tracks how many bytes were written.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush buffers and sync the file contents to disk.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Number of bytes written so far.
    fn position(&self) -> u64;

    /// Finish writing. Syncs to disk when the storage is configured to.
    fn close(&mut self) -> Result<()>;
}

/// Configuration for storage backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Buffer size for readers and writers.
    pub buffer_size: usize,

    /// Whether `close` fsyncs written files.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 65536, // 64KB buffer for better I/O performance
            sync_writes: true,
        }
    }
}
