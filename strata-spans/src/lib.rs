//! # strata-spans
//!
//! Content-addressed span store. Written content is chunked into
//! overlapping byte windows, each hashed with blake3 at write time and
//! verified on every content read.

mod chunker;
mod store;

pub use chunker::{chunk_windows, ChunkPolicy};
pub use store::{SpanStore, SpanStoreSnapshot};
