//! Term dictionary: term → (document frequency, postings offset).
//!
//! File layout (all integers little-endian):
//!
//! ```text
//! magic   u32   "SDCT"
//! version u32
//! length  u64   body length in bytes
//! crc32   u32   checksum of the body
//! body          bincode of the ordered term map
//! ```

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::io::{Read, Write};

use bincode::Options;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpimiError};

const DICTIONARY_MAGIC: u32 = 0x5443_4453; // "SDCT"
const DICTIONARY_VERSION: u32 = 1;

/// Dictionary entry for one term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermInfo {
    /// Number of documents containing the term (length of its postings list).
    pub doc_frequency: u64,
    /// Byte offset of the term's postings list in the sibling postings file.
    pub offset: u64,
}

impl TermInfo {
    pub fn new(doc_frequency: u64, offset: u64) -> Self {
        TermInfo {
            doc_frequency,
            offset,
        }
    }
}

/// Terms in ascending order with their postings metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    terms: BTreeMap<String, TermInfo>,
}

impl Dictionary {
    pub fn new() -> Self {
        Dictionary {
            terms: BTreeMap::new(),
        }
    }

    /// Insert or replace a term's entry.
    pub fn insert(&mut self, term: String, info: TermInfo) -> Option<TermInfo> {
        self.terms.insert(term, info)
    }

    pub fn get(&self, term: &str) -> Option<&TermInfo> {
        self.terms.get(term)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Entries in ascending term order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, TermInfo> {
        self.terms.iter()
    }

    /// Terms in ascending order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// Sum of all document frequencies.
    pub fn total_postings(&self) -> u64 {
        self.terms.values().map(|info| info.doc_frequency).sum()
    }

    /// Serialize the dictionary with its header.
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        let body = bincode::serialize(&self.terms)?;

        writer.write_u32::<LittleEndian>(DICTIONARY_MAGIC)?;
        writer.write_u32::<LittleEndian>(DICTIONARY_VERSION)?;
        writer.write_u64::<LittleEndian>(body.len() as u64)?;
        writer.write_u32::<LittleEndian>(crc32fast::hash(&body))?;
        writer.write_all(&body)?;

        Ok(())
    }

    /// Read and verify a dictionary written by [`Dictionary::write_to`].
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self> {
        let magic = reader.read_u32::<LittleEndian>().map_err(Self::header_error)?;
        if magic != DICTIONARY_MAGIC {
            return Err(SpimiError::codec(format!(
                "not a dictionary file (magic {magic:#010x})"
            )));
        }

        let version = reader.read_u32::<LittleEndian>().map_err(Self::header_error)?;
        if version != DICTIONARY_VERSION {
            return Err(SpimiError::codec(format!(
                "unsupported dictionary version: {version}"
            )));
        }

        let length = reader.read_u64::<LittleEndian>().map_err(Self::header_error)?;
        let checksum = reader.read_u32::<LittleEndian>().map_err(Self::header_error)?;

        let mut body = Vec::new();
        (&mut *reader).take(length).read_to_end(&mut body)?;
        if body.len() as u64 != length {
            return Err(SpimiError::codec(format!(
                "dictionary body truncated: expected {length} bytes, found {}",
                body.len()
            )));
        }
        if crc32fast::hash(&body) != checksum {
            return Err(SpimiError::codec("dictionary checksum mismatch"));
        }

        let terms: BTreeMap<String, TermInfo> = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(body.len() as u64)
            .deserialize(&body)?;
        Ok(Dictionary { terms })
    }

    fn header_error(err: std::io::Error) -> SpimiError {
        SpimiError::codec(format!("dictionary header unreadable: {err}"))
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = (&'a String, &'a TermInfo);
    type IntoIter = btree_map::Iter<'a, String, TermInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.iter()
    }
}

impl FromIterator<(String, TermInfo)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (String, TermInfo)>>(iter: I) -> Self {
        Dictionary {
            terms: iter.into_iter().collect(),
        }
    }
}
