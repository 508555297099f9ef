//! Build configuration.
//!
//! [`SpimiConfig`] replaces process-wide constants: the block budget, scratch
//! location, and worker count are all passed explicitly to the driver. It
//! can be loaded from a JSON file; missing fields take their defaults.
//!
//! ```
//! use spimi::config::SpimiConfig;
//!
//! let config = SpimiConfig::default()
//!     .with_max_docs_per_block(100)
//!     .with_threads(4);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.effective_threads(), 4);
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpimiError};
use crate::storage::StorageConfig;

/// Default number of documents held in memory per block.
pub const DEFAULT_MAX_DOCS_PER_BLOCK: usize = 2500;

/// Default scratch directory for partial indexes.
pub const DEFAULT_TEMP_DIR: &str = "_temp_spimi";

/// Configuration for an index build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpimiConfig {
    /// Maximum number of documents indexed in memory before spilling a block.
    pub max_docs_per_block: usize,

    /// Scratch directory for numbered partial indexes. Cleared before a build.
    pub temp_dir: PathBuf,

    /// Worker threads for the block phase. `1` is fully sequential, `0`
    /// uses one thread per CPU. Merges are always sequential.
    pub threads: usize,

    /// Scratch storage settings.
    pub storage: StorageConfig,
}

impl Default for SpimiConfig {
    fn default() -> Self {
        SpimiConfig {
            max_docs_per_block: DEFAULT_MAX_DOCS_PER_BLOCK,
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            threads: 1,
            storage: StorageConfig::default(),
        }
    }
}

impl SpimiConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            SpimiError::invalid_config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: SpimiConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_docs_per_block(mut self, max_docs_per_block: usize) -> Self {
        self.max_docs_per_block = max_docs_per_block;
        self
    }

    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, temp_dir: P) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_storage(mut self, storage: StorageConfig) -> Self {
        self.storage = storage;
        self
    }

    /// Number of block-phase workers after resolving `0` to the CPU count.
    pub fn effective_threads(&self) -> usize {
        match self.threads {
            0 => num_cpus::get(),
            n => n,
        }
    }

    /// Check that the configuration can drive a build.
    pub fn validate(&self) -> Result<()> {
        if self.max_docs_per_block == 0 {
            return Err(SpimiError::invalid_config(
                "max_docs_per_block must be at least 1",
            ));
        }
        if self.temp_dir.as_os_str().is_empty() {
            return Err(SpimiError::invalid_config("temp_dir must not be empty"));
        }
        if self.storage.buffer_size == 0 {
            return Err(SpimiError::invalid_config(
                "storage.buffer_size must be at least 1",
            ));
        }
        Ok(())
    }
}
