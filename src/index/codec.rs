//! Encoding of a single postings list.
//!
//! The postings file is a plain concatenation of codec records, so every
//! record must be self-delimiting: decoding from a record's first byte
//! consumes exactly that record.

use std::fmt::Debug;
use std::io::Read;

use bincode::Options;

use crate::error::Result;

/// Encode/decode pair for postings lists.
pub trait PostingsCodec: Send + Sync + Debug {
    /// Encode one postings list into a self-delimiting record.
    fn encode(&self, postings: &[String]) -> Result<Vec<u8>>;

    /// Decode exactly one record from the reader's current position.
    ///
    /// `limit` is the number of bytes left in the source. A record claiming
    /// more than that is a codec error, not an allocation.
    fn decode(&self, reader: &mut dyn Read, limit: u64) -> Result<Vec<String>>;

    /// Get the name of this codec.
    fn name(&self) -> &'static str;
}

/// Length-prefixed `bincode` records.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodePostingsCodec;

impl BincodePostingsCodec {
    pub fn new() -> Self {
        BincodePostingsCodec
    }
}

impl PostingsCodec for BincodePostingsCodec {
    fn encode(&self, postings: &[String]) -> Result<Vec<u8>> {
        Ok(bincode::serialize(postings)?)
    }

    fn decode(&self, reader: &mut dyn Read, limit: u64) -> Result<Vec<String>> {
        // Same wire format as `bincode::serialize`, plus a size bound.
        Ok(bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .allow_trailing_bytes()
            .with_limit(limit)
            .deserialize_from(reader)?)
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}
