//! Handle to a numbered partial index in scratch storage.

use std::sync::Arc;

use crate::error::Result;
use crate::index::codec::PostingsCodec;
use crate::index::dictionary::Dictionary;
use crate::index::postings::PostingsReader;
use crate::storage::{Storage, StorageInput};

/// A `(N.dict, N.post)` file pair. Handles are not cloneable: merging
/// consumes both inputs, so a partial index is owned by exactly one stage.
#[derive(Debug, PartialEq, Eq)]
pub struct PartialIndex {
    id: u64,
}

impl PartialIndex {
    pub(crate) fn new(id: u64) -> Self {
        PartialIndex { id }
    }

    /// Block number this index was created from (or inherited from its left input).
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dictionary_file(&self) -> String {
        format!("{}.dict", self.id)
    }

    pub fn postings_file(&self) -> String {
        format!("{}.post", self.id)
    }

    /// Read and verify the dictionary file.
    pub fn load_dictionary(&self, storage: &dyn Storage) -> Result<Dictionary> {
        let mut input = storage.open_input(&self.dictionary_file())?;
        Dictionary::read_from(&mut input)
    }

    /// Open the postings file for random access by dictionary offset.
    pub fn open_postings(
        &self,
        storage: &dyn Storage,
        codec: Arc<dyn PostingsCodec>,
    ) -> Result<PostingsReader<Box<dyn StorageInput>>> {
        let input = storage.open_input(&self.postings_file())?;
        Ok(PostingsReader::new(input, codec))
    }

    /// Remove both files from storage.
    pub fn delete(self, storage: &dyn Storage) -> Result<()> {
        storage.delete_file(&self.dictionary_file())?;
        storage.delete_file(&self.postings_file())
    }
}
