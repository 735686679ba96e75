//! Vector index and retrieval

mod index;
mod retriever;

pub use index::{IndexEntry, ScoredChunk, VectorIndex};
pub use retriever::Retriever;
