//! Two-way merge of partial indexes.
//!
//! The merged output is written to temporary files first. Only after both
//! are fully written and synced are they renamed over the left input, so a
//! failed merge never leaves the left partial index half-written.

use std::cmp::Ordering;
use std::iter;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{Result, SpimiError};
use crate::index::codec::PostingsCodec;
use crate::index::dictionary::{Dictionary, TermInfo};
use crate::index::partial::PartialIndex;
use crate::index::postings::{self, PostingsWriter};
use crate::storage::Storage;

/// Counters for a single merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Distinct terms in the merged dictionary.
    pub terms: u64,
    /// Postings written across all lists.
    pub postings: u64,
    /// Size of the merged postings file.
    pub bytes: u64,
}

/// Merges pairs of partial indexes in scratch storage.
#[derive(Debug, Clone)]
pub struct IndexMerger {
    storage: Arc<dyn Storage>,
    codec: Arc<dyn PostingsCodec>,
}

impl IndexMerger {
    pub fn new(storage: Arc<dyn Storage>, codec: Arc<dyn PostingsCodec>) -> Self {
        IndexMerger { storage, codec }
    }

    /// Merge `right` into `left`.
    ///
    /// The result keeps `left`'s id and files; `right`'s files are deleted.
    /// Any failure is reported as [`SpimiError::Merge`] naming both inputs.
    pub fn merge(&self, left: PartialIndex, right: PartialIndex) -> Result<PartialIndex> {
        let (left_id, right_id) = (left.id(), right.id());

        let stats = self
            .replace_left(&left, &right)
            .map_err(|e| SpimiError::merge(left_id, right_id, e))?;
        right
            .delete(self.storage.as_ref())
            .and_then(|()| self.storage.sync())
            .map_err(|e| SpimiError::merge(left_id, right_id, e))?;

        debug!(
            "Merged partial index {right_id} into {left_id}: {} terms, {} postings, {} bytes",
            stats.terms, stats.postings, stats.bytes
        );

        Ok(left)
    }

    fn replace_left(&self, left: &PartialIndex, right: &PartialIndex) -> Result<MergeStats> {
        let mut temp_files = Vec::with_capacity(2);

        let stats = match self.write_merged(left, right, &mut temp_files) {
            Ok(stats) => stats,
            Err(e) => {
                self.remove_temp_files(&temp_files);
                return Err(e);
            }
        };

        let [postings_temp, dictionary_temp] = temp_files.as_slice() else {
            return Err(SpimiError::internal("merge produced an unexpected file set"));
        };
        self.storage
            .rename_file(postings_temp, &left.postings_file())?;
        self.storage
            .rename_file(dictionary_temp, &left.dictionary_file())?;
        self.storage.sync()?;

        Ok(stats)
    }

    fn write_merged(
        &self,
        left: &PartialIndex,
        right: &PartialIndex,
        temp_files: &mut Vec<String>,
    ) -> Result<MergeStats> {
        let storage = self.storage.as_ref();
        let left_dictionary = left.load_dictionary(storage)?;
        let right_dictionary = right.load_dictionary(storage)?;
        let mut left_postings = left.open_postings(storage, Arc::clone(&self.codec))?;
        let mut right_postings = right.open_postings(storage, Arc::clone(&self.codec))?;

        let (postings_temp, output) =
            storage.create_temp_output(&format!("merge_{}", left.postings_file()))?;
        temp_files.push(postings_temp);
        let mut writer = PostingsWriter::new(output, Arc::clone(&self.codec));

        let mut merged = Dictionary::new();
        let mut stats = MergeStats::default();

        for (term, left_info, right_info) in join_terms(&left_dictionary, &right_dictionary) {
            let left_list = match left_info {
                Some(info) => left_postings.read(info)?,
                None => Vec::new(),
            };
            let right_list = match right_info {
                Some(info) => right_postings.read(info)?,
                None => Vec::new(),
            };

            let union = postings::union_sorted(left_list, right_list);
            let offset = writer.append(&union)?;
            merged.insert(term.to_string(), TermInfo::new(union.len() as u64, offset));

            stats.terms += 1;
            stats.postings += union.len() as u64;
        }
        stats.bytes = writer.finish_synced()?;

        let (dictionary_temp, mut output) =
            storage.create_temp_output(&format!("merge_{}", left.dictionary_file()))?;
        temp_files.push(dictionary_temp);
        merged.write_to(&mut output)?;
        output.flush_and_sync()?;
        output.close()?;

        Ok(stats)
    }

    fn remove_temp_files(&self, temp_files: &[String]) {
        for name in temp_files {
            if let Err(e) = self.storage.delete_file(name) {
                warn!("Failed to remove temporary merge file {name}: {e}");
            }
        }
    }
}

/// Walk two dictionaries in ascending term order, pairing up shared terms.
fn join_terms<'a>(
    left: &'a Dictionary,
    right: &'a Dictionary,
) -> impl Iterator<Item = (&'a str, Option<&'a TermInfo>, Option<&'a TermInfo>)> + 'a {
    let mut left = left.iter().peekable();
    let mut right = right.iter().peekable();

    iter::from_fn(move || {
        let order = match (left.peek(), right.peek()) {
            (Some((l, _)), Some((r, _))) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return None,
        };

        match order {
            Ordering::Less => left
                .next()
                .map(|(term, info)| (term.as_str(), Some(info), None)),
            Ordering::Greater => right
                .next()
                .map(|(term, info)| (term.as_str(), None, Some(info))),
            Ordering::Equal => {
                let (term, left_info) = left.next()?;
                let (_, right_info) = right.next()?;
                Some((term.as_str(), Some(left_info), Some(right_info)))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::block::Block;
    use crate::index::codec::BincodePostingsCodec;
    use crate::index::writer::BlockWriter;
    use crate::storage::StorageConfig;
    use crate::storage::file::FileStorage;
    use std::io::{Read, Write};
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        storage: Arc<dyn Storage>,
        writer: BlockWriter,
        merger: IndexMerger,
    }

    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let storage: Arc<dyn Storage> =
            Arc::new(FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap());
        let codec: Arc<dyn PostingsCodec> = Arc::new(BincodePostingsCodec::new());
        Fixture {
            _temp_dir: temp_dir,
            writer: BlockWriter::new(Arc::clone(&storage), Arc::clone(&codec)),
            merger: IndexMerger::new(Arc::clone(&storage), codec),
            storage,
        }
    }

    fn block(docs: &[(&str, &[&str])]) -> Block {
        let mut block = Block::new();
        for (doc, terms) in docs {
            block.add_document(doc, terms.iter().map(|t| t.to_string()));
        }
        block
    }

    fn contents(fixture: &Fixture, partial: &PartialIndex) -> Vec<(String, Vec<String>)> {
        let storage = fixture.storage.as_ref();
        let dictionary = partial.load_dictionary(storage).unwrap();
        let mut reader = partial
            .open_postings(storage, Arc::new(BincodePostingsCodec::new()))
            .unwrap();
        dictionary
            .iter()
            .map(|(term, info)| (term.clone(), reader.read(info).unwrap()))
            .collect()
    }

    fn owned(entries: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        entries
            .iter()
            .map(|(term, docs)| {
                (
                    term.to_string(),
                    docs.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_merge_unions_shared_terms() {
        let fixture = fixture();
        let a = fixture
            .writer
            .write(block(&[("d1", &["a"]), ("d2", &["b"])]), 1)
            .unwrap();
        let b = fixture
            .writer
            .write(block(&[("d3", &["b"]), ("d4", &["c"])]), 2)
            .unwrap();

        let merged = fixture.merger.merge(a, b).unwrap();

        assert_eq!(merged.id(), 1);
        assert_eq!(
            contents(&fixture, &merged),
            owned(&[("a", &["d1"]), ("b", &["d2", "d3"]), ("c", &["d4"])])
        );
        assert_eq!(fixture.storage.list_files().unwrap(), vec!["1.dict", "1.post"]);
    }

    #[test]
    fn test_merge_with_identical_index_is_unchanged() {
        let fixture = fixture();
        let docs: &[(&str, &[&str])] = &[("x", &["owl", "bat"]), ("y", &["bat"])];
        let first = fixture.writer.write(block(docs), 1).unwrap();
        let second = fixture.writer.write(block(docs), 2).unwrap();
        let before = contents(&fixture, &first);

        let merged = fixture.merger.merge(first, second).unwrap();

        assert_eq!(contents(&fixture, &merged), before);
    }

    #[test]
    fn test_merge_with_empty_side() {
        let fixture = fixture();
        let empty = fixture.writer.write(Block::new(), 1).unwrap();
        let full = fixture.writer.write(block(&[("d1", &["bee"])]), 2).unwrap();

        let merged = fixture.merger.merge(empty, full).unwrap();

        assert_eq!(contents(&fixture, &merged), owned(&[("bee", &["d1"])]));
    }

    #[test]
    fn test_failed_merge_leaves_left_untouched() {
        let fixture = fixture();
        let left = fixture.writer.write(block(&[("d1", &["cat"])]), 1).unwrap();
        let right = fixture.writer.write(block(&[("d2", &["dog"])]), 2).unwrap();

        let read_all = |name: &str| {
            let mut bytes = Vec::new();
            fixture
                .storage
                .open_input(name)
                .unwrap()
                .read_to_end(&mut bytes)
                .unwrap();
            bytes
        };
        let left_dictionary = read_all("1.dict");
        let left_postings = read_all("1.post");

        // Corrupt the right postings so decoding fails mid-merge.
        let mut output = fixture.storage.create_output("2.post").unwrap();
        output.write_all(&[0xFF]).unwrap();
        output.close().unwrap();

        let err = fixture.merger.merge(left, right).unwrap_err();
        assert!(matches!(err, SpimiError::Merge { left: 1, right: 2, .. }));

        assert_eq!(read_all("1.dict"), left_dictionary);
        assert_eq!(read_all("1.post"), left_postings);
        let files = fixture.storage.list_files().unwrap();
        assert!(files.iter().all(|name| !name.ends_with(".tmp")), "{files:?}");
    }

    #[test]
    fn test_join_terms_interleaves() {
        let left: Dictionary = [("a", 0), ("c", 1)]
            .iter()
            .map(|(t, o)| (t.to_string(), TermInfo::new(1, *o)))
            .collect();
        let right: Dictionary = [("b", 5), ("c", 6)]
            .iter()
            .map(|(t, o)| (t.to_string(), TermInfo::new(1, *o)))
            .collect();

        let joined: Vec<_> = join_terms(&left, &right)
            .map(|(term, l, r)| (term, l.map(|i| i.offset), r.map(|i| i.offset)))
            .collect();

        assert_eq!(
            joined,
            vec![
                ("a", Some(0), None),
                ("b", None, Some(5)),
                ("c", Some(1), Some(6)),
            ]
        );
    }
}
