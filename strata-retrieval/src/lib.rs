//! # strata-retrieval
//!
//! The memory retriever: the façade that ties spans, summaries, and
//! references together. Cross-source search with pluggable scoring,
//! multi-hop link traversal, zero-cost peek, budgeted chunking, and
//! incremental context building.

mod retriever;
mod search;

pub use retriever::{ChunkResult, MemoryRetriever, PeekInfo};
pub use search::{HopResult, ResultOrigin, SearchOptions, SearchResult, SortBy};
