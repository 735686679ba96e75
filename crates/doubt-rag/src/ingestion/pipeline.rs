//! Ingestion pipeline orchestration
//!
//! read -> chunk -> embed. Documents that cannot be read are skipped and
//! reported; an embedding failure aborts the whole batch.

use std::sync::Arc;

use super::chunker::TextChunker;
use super::reader::FileReader;
use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::retrieval::{IndexEntry, VectorIndex};
use crate::types::{Document, IndexedDocument, IngestFailure, TextChunk};

/// Embedded chunks for a batch of documents, ready to go into an index
#[derive(Debug, Default)]
pub struct PreparedBatch {
    pub entries: Vec<IndexEntry>,
    pub failures: Vec<IngestFailure>,
    pub documents: Vec<IndexedDocument>,
}

/// A freshly built index plus what happened to each input document
#[derive(Debug)]
pub struct BuildOutcome {
    pub index: VectorIndex,
    pub failures: Vec<IngestFailure>,
    pub documents: Vec<IndexedDocument>,
}

/// Main ingestion pipeline
#[derive(Clone)]
pub struct IngestPipeline {
    reader: FileReader,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl IngestPipeline {
    pub fn new(reader: FileReader, chunker: TextChunker, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            reader,
            chunker,
            embedder,
        }
    }

    pub fn reader(&self) -> &FileReader {
        &self.reader
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Read, chunk and embed `docs`
    pub async fn prepare(&self, docs: &[Document]) -> Result<PreparedBatch> {
        // Parsers are synchronous and some are slow on large files
        let reader = self.reader;
        let owned = docs.to_vec();
        let read = tokio::task::spawn_blocking(move || reader.read_batch(&owned))
            .await
            .map_err(|e| Error::internal(format!("Reader task failed: {}", e)))?;

        let mut batch = PreparedBatch {
            failures: read.failures,
            ..Default::default()
        };
        let mut chunks: Vec<TextChunk> = Vec::new();

        for text in &read.texts {
            let doc_chunks = self.chunker.chunk(text);
            if doc_chunks.is_empty() {
                tracing::warn!("Skipping {}: no text content", text.filename);
                batch.failures.push(IngestFailure {
                    filename: text.filename.clone(),
                    error: "No text content extracted".to_string(),
                });
                continue;
            }

            let content_hash = docs
                .iter()
                .find(|d| d.id == text.document_id)
                .map(Document::content_hash)
                .unwrap_or_default();

            tracing::info!(
                "Chunked {} ({}): {} chunks",
                text.filename,
                text.format,
                doc_chunks.len()
            );
            batch.documents.push(IndexedDocument {
                document_id: text.document_id,
                filename: text.filename.clone(),
                format: text.format,
                content_hash,
                chunks: doc_chunks.len(),
            });
            chunks.extend(doc_chunks);
        }

        if chunks.is_empty() {
            return Ok(batch);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                vectors.len(),
                chunks.len()
            )));
        }

        tracing::info!(
            "Embedded {} chunks with {}",
            chunks.len(),
            self.embedder.name()
        );

        batch.entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();
        Ok(batch)
    }

    /// Build a new index from `docs` alone
    pub async fn build_index(&self, docs: &[Document]) -> Result<BuildOutcome> {
        let batch = self.prepare(docs).await?;
        let index = VectorIndex::from_entries(batch.entries)?;
        Ok(BuildOutcome {
            index,
            failures: batch.failures,
            documents: batch.documents,
        })
    }
}
