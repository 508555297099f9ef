//! Read access to a published index.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, SpimiError};
use crate::index::codec::{BincodePostingsCodec, PostingsCodec};
use crate::index::dictionary::{Dictionary, TermInfo};
use crate::index::postings::PostingsReader;

/// A loaded dictionary plus random access into its postings file.
#[derive(Debug)]
pub struct IndexReader {
    dictionary: Dictionary,
    postings: PostingsReader<BufReader<File>>,
}

impl IndexReader {
    /// Open an index whose postings were written with the bincode codec.
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(dictionary_path: P, postings_path: Q) -> Result<Self> {
        Self::open_with_codec(
            dictionary_path,
            postings_path,
            Arc::new(BincodePostingsCodec::new()),
        )
    }

    pub fn open_with_codec<P: AsRef<Path>, Q: AsRef<Path>>(
        dictionary_path: P,
        postings_path: Q,
        codec: Arc<dyn PostingsCodec>,
    ) -> Result<Self> {
        let dictionary_path = dictionary_path.as_ref();
        let postings_path = postings_path.as_ref();

        let mut dictionary_file = BufReader::new(File::open(dictionary_path).map_err(|e| {
            SpimiError::storage(format!("cannot open {}: {e}", dictionary_path.display()))
        })?);
        let dictionary = Dictionary::read_from(&mut dictionary_file)?;

        let postings_file = File::open(postings_path).map_err(|e| {
            SpimiError::storage(format!("cannot open {}: {e}", postings_path.display()))
        })?;

        Ok(IndexReader {
            dictionary,
            postings: PostingsReader::new(BufReader::new(postings_file), codec),
        })
    }

    /// The term's dictionary entry and decoded postings, or `None` if the
    /// term is not indexed.
    pub fn lookup(&mut self, term: &str) -> Result<Option<(TermInfo, Vec<String>)>> {
        let Some(info) = self.dictionary.get(term).copied() else {
            return Ok(None);
        };
        let postings = self.postings.read(&info)?;
        Ok(Some((info, postings)))
    }

    /// Indexed terms in ascending order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.dictionary.terms()
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_index(dir: &Path, entries: &[(&str, &[&str])]) {
        let codec = BincodePostingsCodec::new();
        let mut postings = Vec::new();
        let mut dictionary = Dictionary::new();

        for (term, docs) in entries {
            let list: Vec<String> = docs.iter().map(|d| d.to_string()).collect();
            let offset = postings.len() as u64;
            postings.extend(codec.encode(&list).unwrap());
            dictionary.insert(term.to_string(), TermInfo::new(list.len() as u64, offset));
        }

        let mut bytes = Vec::new();
        dictionary.write_to(&mut bytes).unwrap();
        fs::write(dir.join("index.dict"), bytes).unwrap();
        fs::write(dir.join("index.post"), postings).unwrap();
    }

    #[test]
    fn test_lookup() {
        let temp_dir = TempDir::new().unwrap();
        write_index(temp_dir.path(), &[("bee", &["2"]), ("cat", &["1", "3"])]);

        let mut reader = IndexReader::open(
            temp_dir.path().join("index.dict"),
            temp_dir.path().join("index.post"),
        )
        .unwrap();

        assert_eq!(reader.len(), 2);
        assert_eq!(reader.terms().collect::<Vec<_>>(), vec!["bee", "cat"]);

        let (info, docs) = reader.lookup("cat").unwrap().unwrap();
        assert_eq!(info.doc_frequency, 2);
        assert_eq!(docs, vec!["1", "3"]);
        assert!(reader.lookup("dog").unwrap().is_none());
    }

    #[test]
    fn test_missing_files() {
        let temp_dir = TempDir::new().unwrap();
        let result = IndexReader::open(
            temp_dir.path().join("index.dict"),
            temp_dir.path().join("index.post"),
        );
        assert!(matches!(result, Err(SpimiError::Storage(_))));
    }
}
