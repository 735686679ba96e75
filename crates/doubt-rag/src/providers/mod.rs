//! Provider abstractions for embeddings and LLM
//!
//! Trait-based so the pipeline can run against the hosted Gemini API or a
//! local Ollama server.

pub mod embedding;
pub mod gemini;
pub mod llm;
pub mod ollama;

use std::sync::Arc;
use std::time::Duration;

pub use embedding::EmbeddingProvider;
pub use gemini::{GeminiClient, GeminiEmbedder};
pub use llm::{GenerationRequest, ImageInput, LlmProvider};
pub use ollama::{OllamaClient, OllamaEmbedder, OllamaLlm};

use crate::config::{BackendProvider, RagConfig};
use crate::error::{Error, Result};

/// Shared HTTP client with the configured request timeout
pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .pool_max_idle_per_host(5)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Build the embedding and LLM providers for the configured backend
pub fn build_providers(
    config: &RagConfig,
) -> Result<(Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>)> {
    match config.backend {
        BackendProvider::Gemini => {
            let embedder = GeminiEmbedder::new(
                &config.gemini,
                &config.embeddings,
                config.llm.timeout_secs,
            )?;
            let llm = GeminiClient::new(&config.gemini, &config.llm)?;
            tracing::info!(
                "Using Gemini backend ({} / {})",
                config.embeddings.model,
                config.llm.model
            );
            Ok((Arc::new(embedder), Arc::new(llm)))
        }
        BackendProvider::Ollama => {
            let client = Arc::new(OllamaClient::new(&config.ollama, &config.llm)?);
            tracing::info!(
                "Using Ollama backend at {} ({} / {})",
                config.ollama.base_url,
                config.ollama.embed_model,
                config.ollama.generate_model
            );
            Ok((
                Arc::new(OllamaEmbedder::from_client(
                    Arc::clone(&client),
                    config.embeddings.dimensions,
                )),
                Arc::new(OllamaLlm::from_client(client)),
            ))
        }
    }
}
