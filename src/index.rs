//! Block construction and external merge.
//!
//! A build runs in three strictly ordered phases:
//!
//! ```text
//! COLLECTING: paths ─▶ BlockBuilder ─▶ Block ─▶ BlockWriter ─▶ 1.dict/1.post, 2.dict/2.post, ...
//! MERGING:    pop two newest ─▶ IndexMerger ─▶ push result   (until one remains)
//! PUBLISHED:  copy the survivor next to the outputs, fsync, rename into place
//! ```
//!
//! [`driver::IndexDriver`] owns the schedule; the other modules are the
//! individual steps and the on-disk formats they share.

pub mod block;
pub mod codec;
pub mod dictionary;
pub mod driver;
pub mod merger;
pub mod partial;
pub mod postings;
pub mod reader;
pub mod writer;

pub use block::{Block, BlockBuilder};
pub use codec::{BincodePostingsCodec, PostingsCodec};
pub use dictionary::{Dictionary, TermInfo};
pub use driver::{BuildPhase, BuildStats, IndexDriver};
pub use merger::{IndexMerger, MergeStats};
pub use partial::PartialIndex;
pub use reader::IndexReader;
pub use writer::BlockWriter;
