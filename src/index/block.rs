//! In-memory block construction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::analyzer::Analyzer;
use crate::error::{Result, SpimiError};
use crate::index::postings;

/// Term → documents containing it, for one bounded batch of documents.
///
/// Lists are kept in insertion order; [`Block::into_sorted`] imposes the
/// on-disk ordering.
#[derive(Debug, Clone, Default)]
pub struct Block {
    postings: AHashMap<String, Vec<String>>,
    document_count: usize,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every term of one document. Repeated terms contribute a single
    /// posting.
    pub fn add_document<I>(&mut self, doc_id: &str, terms: I)
    where
        I: IntoIterator<Item = String>,
    {
        for term in terms {
            let list = self.postings.entry(term).or_default();
            if list.last().map(String::as_str) != Some(doc_id) {
                list.push(doc_id.to_string());
            }
        }
        self.document_count += 1;
    }

    pub fn get(&self, term: &str) -> Option<&[String]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn term_count(&self) -> usize {
        self.postings.len()
    }

    /// Documents consumed into this block.
    pub fn document_count(&self) -> usize {
        self.document_count
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Terms ascending, each with an ascending duplicate-free list.
    pub fn into_sorted(self) -> Vec<(String, Vec<String>)> {
        let mut entries: Vec<(String, Vec<String>)> = self
            .postings
            .into_iter()
            .map(|(term, mut list)| {
                postings::canonicalize(&mut list);
                (term, list)
            })
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// Reads documents and accumulates their terms into a [`Block`].
pub struct BlockBuilder {
    analyzer: Arc<dyn Analyzer>,
    max_docs_per_block: usize,
}

impl std::fmt::Debug for BlockBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockBuilder")
            .field("analyzer", &self.analyzer.name())
            .field("max_docs_per_block", &self.max_docs_per_block)
            .finish()
    }
}

impl BlockBuilder {
    pub fn new(analyzer: Arc<dyn Analyzer>, max_docs_per_block: usize) -> Self {
        BlockBuilder {
            analyzer,
            max_docs_per_block,
        }
    }

    pub fn max_docs_per_block(&self) -> usize {
        self.max_docs_per_block
    }

    /// Consume up to `max_docs_per_block` paths from the front of `paths`.
    ///
    /// Returns the unconsumed remainder and the block. A document that cannot
    /// be read fails the whole block.
    pub fn build<'a>(&self, paths: &'a [PathBuf]) -> Result<(&'a [PathBuf], Block)> {
        let take = self.max_docs_per_block.max(1).min(paths.len());
        let (batch, remaining) = paths.split_at(take);

        let mut block = Block::new();
        for path in batch {
            self.add_path(&mut block, path)?;
        }

        Ok((remaining, block))
    }

    fn add_path(&self, block: &mut Block, path: &Path) -> Result<()> {
        let doc_id = document_id(path)?;
        let bytes = fs::read(path).map_err(|e| SpimiError::document_read(path, e))?;
        let text = String::from_utf8_lossy(&bytes);

        let terms = self.analyzer.terms(&text)?;
        block.add_document(&doc_id, terms);
        Ok(())
    }
}

/// The document identifier: the path's final component.
pub fn document_id(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SpimiError::document_read(
                path,
                io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::english::EnglishAnalyzer;
    use tempfile::TempDir;

    fn builder(max_docs: usize) -> BlockBuilder {
        BlockBuilder::new(Arc::new(EnglishAnalyzer::new()), max_docs)
    }

    fn write_docs(dir: &Path, docs: &[(&str, &str)]) -> Vec<PathBuf> {
        docs.iter()
            .map(|(name, text)| {
                let path = dir.join(name);
                fs::write(&path, text).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_repeated_term_counts_once() {
        let mut block = Block::new();
        block.add_document("d1", ["cat", "cat", "dog", "cat"].map(String::from));
        block.add_document("d2", ["cat"].map(String::from));

        assert_eq!(block.get("cat").unwrap(), ["d1", "d2"]);
        assert_eq!(block.get("dog").unwrap(), ["d1"]);
        assert_eq!(block.document_count(), 2);
        assert_eq!(block.term_count(), 2);
    }

    #[test]
    fn test_into_sorted_orders_terms_and_postings() {
        let mut block = Block::new();
        block.add_document("b", ["zeta", "alpha"].map(String::from));
        block.add_document("a", ["alpha"].map(String::from));

        let sorted = block.into_sorted();
        assert_eq!(
            sorted,
            vec![
                ("alpha".to_string(), vec!["a".to_string(), "b".to_string()]),
                ("zeta".to_string(), vec!["b".to_string()]),
            ]
        );
    }

    #[test]
    fn test_build_consumes_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_docs(
            temp_dir.path(),
            &[("1", "cat"), ("2", "dog"), ("3", "fox")],
        );

        let builder = builder(2);
        let (remaining, block) = builder.build(&paths).unwrap();
        assert_eq!(block.document_count(), 2);
        assert_eq!(remaining, &paths[2..]);
        assert!(block.get("fox").is_none());

        let (remaining, block) = builder.build(remaining).unwrap();
        assert!(remaining.is_empty());
        assert_eq!(block.get("fox").unwrap(), ["3"]);
    }

    #[test]
    fn test_missing_document_fails_block() {
        let temp_dir = TempDir::new().unwrap();
        let mut paths = write_docs(temp_dir.path(), &[("1", "cat")]);
        paths.push(temp_dir.path().join("missing"));

        let err = builder(10).build(&paths).unwrap_err();
        assert!(matches!(err, SpimiError::DocumentRead { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bin");
        fs::write(&path, b"owl \xFF\xFE bat").unwrap();

        let (_, block) = builder(10).build(&[path]).unwrap();
        assert_eq!(block.get("owl").unwrap(), ["bin"]);
        assert_eq!(block.get("bat").unwrap(), ["bin"]);
    }

    #[test]
    fn test_document_id_requires_file_name() {
        assert_eq!(document_id(Path::new("/corpus/doc-7")).unwrap(), "doc-7");
        assert!(document_id(Path::new("..")).is_err());
    }
}
