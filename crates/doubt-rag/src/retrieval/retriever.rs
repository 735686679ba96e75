//! Question-to-chunks retrieval

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use super::index::{ScoredChunk, VectorIndex};
use crate::error::Result;
use crate::providers::EmbeddingProvider;

/// Embeds a question and queries an index snapshot
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Top `k` chunks for `question`
    pub async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if index.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(question).await?;
        index.query(&vector, k)
    }

    /// Top `k` chunks for `question`, only from the given documents
    pub async fn retrieve_from(
        &self,
        index: &VectorIndex,
        question: &str,
        k: usize,
        documents: &HashSet<Uuid>,
    ) -> Result<Vec<ScoredChunk>> {
        if index.is_empty() || k == 0 || documents.is_empty() {
            return Ok(Vec::new());
        }
        let vector = self.embedder.embed(question).await?;
        index.query_filtered(&vector, k, |chunk| documents.contains(&chunk.document_id))
    }
}
