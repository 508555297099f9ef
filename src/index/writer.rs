//! Spills an in-memory block to a numbered partial index.

use std::sync::Arc;

use log::info;

use crate::error::Result;
use crate::index::block::Block;
use crate::index::codec::PostingsCodec;
use crate::index::dictionary::{Dictionary, TermInfo};
use crate::index::partial::PartialIndex;
use crate::index::postings::PostingsWriter;
use crate::storage::Storage;

/// Writes blocks as `(N.dict, N.post)` pairs in scratch storage.
#[derive(Debug, Clone)]
pub struct BlockWriter {
    storage: Arc<dyn Storage>,
    codec: Arc<dyn PostingsCodec>,
}

impl BlockWriter {
    pub fn new(storage: Arc<dyn Storage>, codec: Arc<dyn PostingsCodec>) -> Self {
        BlockWriter { storage, codec }
    }

    /// Write `block` as partial index `id`.
    ///
    /// Terms are written in ascending order and each postings list is sorted
    /// before encoding. Both files are closed (and synced, if configured)
    /// before the handle is returned.
    pub fn write(&self, block: Block, id: u64) -> Result<PartialIndex> {
        let partial = PartialIndex::new(id);
        let documents = block.document_count();

        let output = self.storage.create_output(&partial.postings_file())?;
        let mut postings = PostingsWriter::new(output, Arc::clone(&self.codec));
        let mut dictionary = Dictionary::new();

        for (term, list) in block.into_sorted() {
            let offset = postings.append(&list)?;
            dictionary.insert(term, TermInfo::new(list.len() as u64, offset));
        }
        let postings_bytes = postings.finish()?;

        let mut output = self.storage.create_output(&partial.dictionary_file())?;
        dictionary.write_to(&mut output)?;
        output.close()?;

        info!(
            "Wrote partial index {id}: {documents} documents, {} terms, {postings_bytes} postings bytes",
            dictionary.len()
        );

        Ok(partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::codec::BincodePostingsCodec;
    use crate::index::postings::is_canonical;
    use crate::storage::StorageConfig;
    use crate::storage::file::FileStorage;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<dyn Storage>, BlockWriter) {
        let temp_dir = TempDir::new().unwrap();
        let storage: Arc<dyn Storage> =
            Arc::new(FileStorage::new(temp_dir.path(), StorageConfig::default()).unwrap());
        let writer = BlockWriter::new(Arc::clone(&storage), Arc::new(BincodePostingsCodec::new()));
        (temp_dir, storage, writer)
    }

    #[test]
    fn test_offsets_point_at_each_list() {
        let (_temp_dir, storage, writer) = setup();

        let mut block = Block::new();
        block.add_document("d9", ["pear", "fig"].map(String::from));
        block.add_document("d1", ["pear"].map(String::from));
        block.add_document("d5", ["apple", "pear"].map(String::from));

        let partial = writer.write(block, 4).unwrap();
        assert_eq!(partial.id(), 4);

        let dictionary = partial.load_dictionary(storage.as_ref()).unwrap();
        assert_eq!(dictionary.terms().collect::<Vec<_>>(), ["apple", "fig", "pear"]);
        assert_eq!(dictionary.get("apple").unwrap().offset, 0);

        let mut reader = partial
            .open_postings(storage.as_ref(), Arc::new(BincodePostingsCodec::new()))
            .unwrap();
        let pear = reader.read(dictionary.get("pear").unwrap()).unwrap();
        assert_eq!(pear, ["d1", "d5", "d9"]);

        for (_, info) in &dictionary {
            let list = reader.read(info).unwrap();
            assert_eq!(list.len() as u64, info.doc_frequency);
            assert!(is_canonical(&list));
        }
    }

    #[test]
    fn test_empty_block_writes_empty_pair() {
        let (_temp_dir, storage, writer) = setup();

        let partial = writer.write(Block::new(), 1).unwrap();

        assert!(partial.load_dictionary(storage.as_ref()).unwrap().is_empty());
        assert_eq!(storage.file_size(&partial.postings_file()).unwrap(), 0);
    }
}
