//! Orchestration of a complete index build.
//!
//! # Example
//!
//! ```
//! use std::fs;
//!
//! use spimi::config::SpimiConfig;
//! use spimi::index::{IndexDriver, IndexReader};
//!
//! # fn main() -> spimi::error::Result<()> {
//! let dir = tempfile::TempDir::new()?;
//! let corpus = dir.path().join("corpus");
//! fs::create_dir(&corpus)?;
//! fs::write(corpus.join("1"), "the cat sat")?;
//! fs::write(corpus.join("2"), "the dog sat")?;
//!
//! let config = SpimiConfig::default()
//!     .with_max_docs_per_block(1)
//!     .with_temp_dir(dir.path().join("scratch"));
//! let mut driver = IndexDriver::new(config)?;
//! let stats = driver.build(&corpus, &dir.path().join("index.dict"), &dir.path().join("index.post"))?;
//! assert_eq!(stats.blocks_written, 2);
//! assert_eq!(stats.merges, 1);
//!
//! let mut reader = IndexReader::open(dir.path().join("index.dict"), dir.path().join("index.post"))?;
//! let (_, docs) = reader.lookup("sat")?.unwrap();
//! assert_eq!(docs, vec!["1", "2"]);
//! # Ok(())
//! # }
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::Analyzer;
use crate::analysis::analyzer::english::EnglishAnalyzer;
use crate::config::SpimiConfig;
use crate::error::{Result, SpimiError};
use crate::index::block::BlockBuilder;
use crate::index::codec::{BincodePostingsCodec, PostingsCodec};
use crate::index::merger::IndexMerger;
use crate::index::partial::PartialIndex;
use crate::index::writer::BlockWriter;
use crate::storage::Storage;
use crate::storage::file::FileStorage;

/// Where a build currently stands. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    /// Reading documents and spilling blocks.
    Collecting,
    /// Reducing partial indexes to one.
    Merging,
    /// Outputs are in place.
    Published,
    /// A phase failed or was cancelled; nothing was published.
    Failed,
}

impl std::fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildPhase::Collecting => "collecting",
            BuildPhase::Merging => "merging",
            BuildPhase::Published => "published",
            BuildPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a finished build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub documents: u64,
    pub blocks_written: u64,
    pub merges: u64,
    pub terms: u64,
    pub postings: u64,
    pub elapsed_ms: u64,
}

/// Drives documents through block building, merging, and publication.
pub struct IndexDriver {
    config: SpimiConfig,
    analyzer: Arc<dyn Analyzer>,
    codec: Arc<dyn PostingsCodec>,
    storage: Arc<dyn Storage>,
    phase: BuildPhase,
    cancelled: Arc<AtomicBool>,
    stats: BuildStats,
}

impl std::fmt::Debug for IndexDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexDriver")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer.name())
            .field("codec", &self.codec.name())
            .field("phase", &self.phase)
            .field("stats", &self.stats)
            .finish()
    }
}

impl IndexDriver {
    /// Create a driver with the English analyzer and bincode postings,
    /// using `config.temp_dir` as scratch storage.
    pub fn new(config: SpimiConfig) -> Result<Self> {
        config.validate()?;
        let storage = FileStorage::new(&config.temp_dir, config.storage.clone())?;

        Ok(IndexDriver {
            config,
            analyzer: Arc::new(EnglishAnalyzer::new()),
            codec: Arc::new(BincodePostingsCodec::new()),
            storage: Arc::new(storage),
            phase: BuildPhase::Collecting,
            cancelled: Arc::new(AtomicBool::new(false)),
            stats: BuildStats::default(),
        })
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn PostingsCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Share a cancellation flag with another thread. Setting it aborts the
    /// build before the next block or merge.
    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    pub fn config(&self) -> &SpimiConfig {
        &self.config
    }

    /// Scratch storage holding partial indexes.
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Run all three phases. On failure the scratch directory is cleared and
    /// the output paths are left as they were.
    pub fn build(
        &mut self,
        input_dir: &Path,
        dictionary_path: &Path,
        postings_path: &Path,
    ) -> Result<BuildStats> {
        let start = Instant::now();

        let result = list_documents(input_dir)
            .and_then(|paths| self.collect(&paths))
            .and_then(|pending| self.merge_all(pending))
            .and_then(|index| self.publish(index, dictionary_path, postings_path));

        if let Err(e) = result {
            self.phase = BuildPhase::Failed;
            if let Err(clear_err) = self.storage.clear() {
                warn!("Failed to clear scratch storage: {clear_err}");
            }
            warn!("Build failed: {e}");
            return Err(e);
        }

        self.stats.elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "Built index: {} documents, {} terms, {} postings in {} ms",
            self.stats.documents, self.stats.terms, self.stats.postings, self.stats.elapsed_ms
        );
        Ok(self.stats.clone())
    }

    /// COLLECTING: spill `paths` as numbered blocks. Always writes at least
    /// one (possibly empty) block.
    pub fn collect(&mut self, paths: &[PathBuf]) -> Result<Vec<PartialIndex>> {
        self.expect_phase(BuildPhase::Collecting, "collect")?;
        info!(
            "Collecting {} documents in blocks of {}",
            paths.len(),
            self.config.max_docs_per_block
        );

        let result = self.storage.clear().and_then(|()| {
            if self.config.effective_threads() > 1 && paths.len() > self.config.max_docs_per_block
            {
                self.collect_parallel(paths)
            } else {
                self.collect_sequential(paths)
            }
        });

        let partials = self.track(result)?;
        self.stats.documents = paths.len() as u64;
        self.stats.blocks_written = partials.len() as u64;
        self.phase = BuildPhase::Merging;
        Ok(partials)
    }

    /// MERGING: reduce the pending stack to one partial index, always merging
    /// the two most recent (left = older).
    pub fn merge_all(&mut self, pending: Vec<PartialIndex>) -> Result<PartialIndex> {
        self.expect_phase(BuildPhase::Merging, "merge")?;
        info!("Merging {} partial indexes", pending.len());

        let result = self.merge_stack(pending);
        self.track(result)
    }

    /// PUBLISHED: copy `index` to the output paths, then drop it from scratch.
    pub fn publish(
        &mut self,
        index: PartialIndex,
        dictionary_path: &Path,
        postings_path: &Path,
    ) -> Result<()> {
        self.expect_phase(BuildPhase::Merging, "publish")?;

        let result = self.publish_files(index, dictionary_path, postings_path);
        self.track(result)?;

        self.phase = BuildPhase::Published;
        info!(
            "Published {} and {}",
            dictionary_path.display(),
            postings_path.display()
        );
        Ok(())
    }

    fn collect_sequential(&self, paths: &[PathBuf]) -> Result<Vec<PartialIndex>> {
        let builder = BlockBuilder::new(Arc::clone(&self.analyzer), self.config.max_docs_per_block);
        let writer = self.block_writer();

        let mut partials = Vec::new();
        let mut remaining = paths;
        loop {
            self.check_cancelled()?;
            let (rest, block) = builder.build(remaining)?;
            partials.push(writer.write(block, partials.len() as u64 + 1)?);

            remaining = rest;
            if remaining.is_empty() {
                break;
            }
        }

        Ok(partials)
    }

    fn collect_parallel(&self, paths: &[PathBuf]) -> Result<Vec<PartialIndex>> {
        let threads = self.config.effective_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("spimi-block-{i}"))
            .build()
            .map_err(|e| SpimiError::internal(format!("Failed to create thread pool: {e}")))?;
        debug!("Building blocks on {threads} threads");

        let builder = BlockBuilder::new(Arc::clone(&self.analyzer), self.config.max_docs_per_block);
        let writer = self.block_writer();

        pool.install(|| {
            paths
                .par_chunks(self.config.max_docs_per_block)
                .enumerate()
                .map(|(i, chunk)| {
                    self.check_cancelled()?;
                    let (_, block) = builder.build(chunk)?;
                    writer.write(block, i as u64 + 1)
                })
                .collect()
        })
    }

    fn merge_stack(&mut self, mut pending: Vec<PartialIndex>) -> Result<PartialIndex> {
        let merger = IndexMerger::new(Arc::clone(&self.storage), Arc::clone(&self.codec));

        while pending.len() > 1 {
            self.check_cancelled()?;
            let right = pending
                .pop()
                .ok_or_else(|| SpimiError::internal("merge stack underflow"))?;
            let left = pending
                .pop()
                .ok_or_else(|| SpimiError::internal("merge stack underflow"))?;

            pending.push(merger.merge(left, right)?);
            self.stats.merges += 1;
        }

        pending
            .pop()
            .ok_or_else(|| SpimiError::invalid_operation("no partial indexes to merge"))
    }

    fn publish_files(
        &mut self,
        index: PartialIndex,
        dictionary_path: &Path,
        postings_path: &Path,
    ) -> Result<()> {
        self.check_cancelled()?;
        let dictionary = index.load_dictionary(self.storage.as_ref())?;

        let dictionary_stage = sibling_path(dictionary_path, "tmp")?;
        let postings_stage = sibling_path(postings_path, "tmp")?;
        let postings_backup = sibling_path(postings_path, "bak")?;

        let staged = self
            .stage(&index.dictionary_file(), &dictionary_stage)
            .and_then(|()| self.stage(&index.postings_file(), &postings_stage));
        if let Err(e) = staged {
            remove_staged(&[&dictionary_stage, &postings_stage]);
            return Err(e);
        }

        // Postings go first. Until the dictionary lands, the old postings are
        // kept aside so a failed dictionary rename can put them back.
        let had_postings = postings_path.exists();
        if had_postings {
            if let Err(e) = fs::rename(postings_path, &postings_backup) {
                remove_staged(&[&dictionary_stage, &postings_stage]);
                return Err(e.into());
            }
        }
        let promoted = fs::rename(&postings_stage, postings_path)
            .and_then(|()| fs::rename(&dictionary_stage, dictionary_path));
        if let Err(e) = promoted {
            restore_postings(postings_path, &postings_backup, had_postings);
            remove_staged(&[&dictionary_stage, &postings_stage]);
            return Err(e.into());
        }
        if had_postings {
            remove_staged(&[&postings_backup]);
        }

        index.delete(self.storage.as_ref())?;
        self.storage.sync()?;

        self.stats.terms = dictionary.len() as u64;
        self.stats.postings = dictionary.total_postings();
        Ok(())
    }

    /// Copy a scratch file to `target` and fsync it.
    fn stage(&self, name: &str, target: &Path) -> Result<()> {
        let mut input = self.storage.open_input(name)?;
        let mut file = File::create(target)?;
        io::copy(&mut input, &mut file)?;
        file.sync_all()?;
        Ok(())
    }

    fn block_writer(&self) -> BlockWriter {
        BlockWriter::new(Arc::clone(&self.storage), Arc::clone(&self.codec))
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(SpimiError::cancelled("index build was cancelled"));
        }
        Ok(())
    }

    fn expect_phase(&self, expected: BuildPhase, operation: &str) -> Result<()> {
        if self.phase != expected {
            return Err(SpimiError::invalid_operation(format!(
                "cannot {operation} while {} (expected {expected})",
                self.phase
            )));
        }
        Ok(())
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.phase = BuildPhase::Failed;
        }
        result
    }
}

/// Regular files directly inside `input_dir`, sorted by name.
pub fn list_documents(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(input_dir).map_err(|e| SpimiError::document_read(input_dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SpimiError::document_read(input_dir, e))?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    Ok(paths)
}

/// Hidden sibling used while an output file is being written.
/// Hidden sibling of an output path, `.{name}.{suffix}`.
fn sibling_path(target: &Path, suffix: &str) -> Result<PathBuf> {
    let file_name = target.file_name().ok_or_else(|| {
        SpimiError::storage(format!(
            "output path has no file name: {}",
            target.display()
        ))
    })?;
    Ok(target.with_file_name(format!(
        ".{}.{suffix}",
        file_name.to_string_lossy()
    )))
}

/// Undo a half-finished promotion: put the previous postings back, or drop
/// the new ones if there were none.
fn restore_postings(postings_path: &Path, backup: &Path, had_postings: bool) {
    let restored = if had_postings {
        fs::rename(backup, postings_path)
    } else {
        match fs::remove_file(postings_path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    };
    if let Err(e) = restored {
        warn!(
            "Failed to restore previous postings at {}: {e}",
            postings_path.display()
        );
    }
}

fn remove_staged(paths: &[&Path]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove staging file {}: {e}", path.display());
            }
        }
    }
}
