//! Application state for the doubt-rag server

use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::AnswerGenerator;
use crate::ingestion::{FileReader, IngestPipeline, TextChunker};
use crate::providers::{build_providers, EmbeddingProvider, LlmProvider};
use crate::retrieval::{Retriever, VectorIndex};
use crate::types::{Document, IndexStats, IndexedDocument, IngestFailure};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// LLM provider (Gemini or Ollama)
    llm_provider: Arc<dyn LlmProvider>,
    /// read -> chunk -> embed
    pipeline: IngestPipeline,
    retriever: Retriever,
    generator: AnswerGenerator,
    /// Current index snapshot, replaced wholesale on every change
    index: RwLock<Arc<VectorIndex>>,
    /// Documents present in the index; written only under the `index` write lock
    documents: DashMap<Uuid, IndexedDocument>,
    /// Language model answered the last health check
    ready: RwLock<bool>,
}

/// What happened to each document of an upload
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Newly indexed documents
    pub indexed: Vec<IndexedDocument>,
    /// Uploads whose content was already indexed
    pub reused: Vec<IndexedDocument>,
    /// Uploads that could not be read
    pub skipped: Vec<IngestFailure>,
}

impl IngestReport {
    /// IDs of the indexed documents holding this upload's content
    pub fn document_ids(&self) -> HashSet<Uuid> {
        self.indexed
            .iter()
            .chain(&self.reused)
            .map(|d| d.document_id)
            .collect()
    }
}

impl AppState {
    /// Create application state with the providers selected by `config`
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state (backend: {:?})...", config.backend);
        let (embedder, llm) = build_providers(&config)?;
        Self::from_parts(config, embedder, llm)
    }

    /// Create application state around existing providers
    pub fn from_parts(
        config: RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let chunker = TextChunker::from_config(&config.chunking)?;
        let pipeline = IngestPipeline::new(
            FileReader::new(),
            chunker,
            Arc::clone(&embedding_provider),
        );
        let retriever = Retriever::new(Arc::clone(&embedding_provider));
        let generator = AnswerGenerator::new(Arc::clone(&llm_provider));

        tracing::info!(
            "Pipeline ready (chunk size {}, overlap {}, embedder {}, llm {})",
            chunker.chunk_size(),
            chunker.overlap(),
            embedding_provider.name(),
            llm_provider.model()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                llm_provider,
                pipeline,
                retriever,
                generator,
                index: RwLock::new(Arc::new(VectorIndex::empty())),
                documents: DashMap::new(),
                ready: RwLock::new(true),
            }),
        })
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get LLM provider
    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }

    pub fn pipeline(&self) -> &IngestPipeline {
        &self.inner.pipeline
    }

    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.inner.generator
    }

    /// Current index; stays consistent even if a new one is swapped in
    pub fn snapshot(&self) -> Arc<VectorIndex> {
        self.inner.index.read().clone()
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Ask the language model whether it is reachable and record the answer
    /// as the ready state
    pub async fn check_llm(&self) -> bool {
        let llm = &self.inner.llm_provider;
        let reachable = match llm.health_check().await {
            Ok(reachable) => reachable,
            Err(e) => {
                tracing::warn!("{} health check failed: {}", llm.name(), e);
                false
            }
        };
        self.set_ready(reachable);
        reachable
    }

    /// Find an indexed document by content hash
    pub fn find_by_hash(&self, content_hash: &str) -> Option<IndexedDocument> {
        self.inner
            .documents
            .iter()
            .find(|entry| entry.value().content_hash == content_hash)
            .map(|entry| entry.value().clone())
    }

    /// Read, chunk and embed `docs`, then swap in an index holding them
    ///
    /// Content that is already indexed (same SHA-256) is not embedded again.
    pub async fn add_documents(&self, docs: Vec<Document>) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut fresh = Vec::with_capacity(docs.len());

        for doc in docs {
            let hash = doc.content_hash();
            if let Some(existing) = self.find_by_hash(&hash) {
                tracing::info!("{} already indexed as {}", doc.filename, existing.filename);
                report.reused.push(existing);
            } else if seen.insert(hash) {
                fresh.push(doc);
            } else {
                tracing::info!("{} duplicates another file in this upload", doc.filename);
            }
        }

        let batch = self.inner.pipeline.prepare(&fresh).await?;
        report.skipped = batch.failures;

        let mut index = self.inner.index.write();

        // Another upload may have indexed the same content while this one embedded
        let mut raced = HashSet::new();
        for doc in batch.documents {
            match self.find_by_hash(&doc.content_hash) {
                Some(existing) => {
                    tracing::info!(
                        "{} was indexed concurrently as {}",
                        doc.filename,
                        existing.filename
                    );
                    raced.insert(doc.document_id);
                    report.reused.push(existing);
                }
                None => report.indexed.push(doc),
            }
        }
        let entries: Vec<_> = batch
            .entries
            .into_iter()
            .filter(|e| !raced.contains(&e.chunk.document_id))
            .collect();

        if !entries.is_empty() {
            let rebuilt = index.rebuild_with(entries)?;
            tracing::info!(
                "Index rebuilt: {} -> {} chunks",
                index.len(),
                rebuilt.len()
            );
            *index = Arc::new(rebuilt);
        }

        for doc in &report.indexed {
            self.inner.documents.insert(doc.document_id, doc.clone());
        }

        Ok(report)
    }

    /// Drop every indexed document
    pub fn reset_index(&self) {
        let mut index = self.inner.index.write();
        *index = Arc::new(VectorIndex::empty());
        self.inner.documents.clear();
        tracing::info!("Index cleared");
    }

    /// Chunk count, dimensionality and documents of the current index
    pub fn stats(&self) -> IndexStats {
        let index = self.snapshot();
        let documents = index
            .document_ids()
            .into_iter()
            .filter_map(|id| self.inner.documents.get(&id).map(|d| d.value().clone()))
            .collect();

        IndexStats {
            chunks: index.len(),
            dimensions: index.dimensions(),
            documents,
        }
    }
}
