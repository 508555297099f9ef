//! Postings list operations and the postings file reader/writer.

use std::cmp::Ordering;
use std::io::{Read, Seek, SeekFrom, Write};
use std::sync::Arc;

use crate::error::{Result, SpimiError};
use crate::index::codec::PostingsCodec;
use crate::index::dictionary::TermInfo;
use crate::storage::StorageOutput;

/// Sort a postings list ascending and drop duplicate identifiers.
pub fn canonicalize(postings: &mut Vec<String>) {
    postings.sort_unstable();
    postings.dedup();
}

/// Whether a list is strictly ascending (sorted, no duplicates).
pub fn is_canonical(postings: &[String]) -> bool {
    postings.windows(2).all(|pair| pair[0] < pair[1])
}

/// Union of two ascending postings lists, ascending and duplicate-free.
pub fn union_sorted(left: Vec<String>, right: Vec<String>) -> Vec<String> {
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.cmp(r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };

        let next = match order {
            Ordering::Less => left.next(),
            Ordering::Greater => right.next(),
            Ordering::Equal => {
                right.next();
                left.next()
            }
        };

        if let Some(doc) = next {
            if merged.last() != Some(&doc) {
                merged.push(doc);
            }
        }
    }

    merged
}

/// Appends encoded postings lists to a postings file.
#[derive(Debug)]
pub struct PostingsWriter {
    output: Box<dyn StorageOutput>,
    codec: Arc<dyn PostingsCodec>,
    offset: u64,
}

impl PostingsWriter {
    pub fn new(output: Box<dyn StorageOutput>, codec: Arc<dyn PostingsCodec>) -> Self {
        PostingsWriter {
            output,
            codec,
            offset: 0,
        }
    }

    /// Append one list and return the offset at which it starts.
    pub fn append(&mut self, postings: &[String]) -> Result<u64> {
        let bytes = self.codec.encode(postings)?;
        let offset = self.offset;
        self.output.write_all(&bytes)?;
        self.offset += bytes.len() as u64;
        Ok(offset)
    }

    /// Bytes written so far.
    pub fn len(&self) -> u64 {
        self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.offset == 0
    }

    /// Close the file. Returns the total number of bytes written.
    pub fn finish(mut self) -> Result<u64> {
        self.output.close()?;
        Ok(self.offset)
    }

    /// Like [`PostingsWriter::finish`], but always fsyncs regardless of the
    /// storage's sync policy.
    pub fn finish_synced(mut self) -> Result<u64> {
        self.output.flush_and_sync()?;
        self.output.close()?;
        Ok(self.offset)
    }
}

/// Reads postings lists at dictionary offsets.
#[derive(Debug)]
pub struct PostingsReader<R: Read + Seek> {
    reader: R,
    codec: Arc<dyn PostingsCodec>,
    len: Option<u64>,
}

impl<R: Read + Seek> PostingsReader<R> {
    pub fn new(reader: R, codec: Arc<dyn PostingsCodec>) -> Self {
        PostingsReader {
            reader,
            codec,
            len: None,
        }
    }

    /// Total size of the underlying postings file.
    pub fn file_len(&mut self) -> Result<u64> {
        if let Some(len) = self.len {
            return Ok(len);
        }
        let len = self.reader.seek(SeekFrom::End(0))?;
        self.len = Some(len);
        Ok(len)
    }

    /// Decode the list described by `info`, checking its length against the
    /// recorded document frequency.
    pub fn read(&mut self, info: &TermInfo) -> Result<Vec<String>> {
        let len = self.file_len()?;
        if info.offset > len {
            return Err(SpimiError::codec(format!(
                "postings offset {} is past the end of the file ({len} bytes)",
                info.offset
            )));
        }

        self.reader.seek(SeekFrom::Start(info.offset))?;
        let postings = self.codec.decode(&mut self.reader, len - info.offset)?;

        if postings.len() as u64 != info.doc_frequency {
            return Err(SpimiError::codec(format!(
                "postings list at offset {} has {} entries, dictionary records {}",
                info.offset,
                postings.len(),
                info.doc_frequency
            )));
        }

        Ok(postings)
    }
}
