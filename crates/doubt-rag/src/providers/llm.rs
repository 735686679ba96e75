//! LLM provider trait for generating answers

use async_trait::async_trait;
use base64::Engine as _;

use crate::error::Result;

/// An image attached to a generation request
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// MIME type (image/png, image/jpeg, image/webp)
    pub mime_type: String,
    /// Raw image bytes
    pub data: bytes::Bytes,
}

impl ImageInput {
    pub fn new(mime_type: impl Into<String>, data: impl Into<bytes::Bytes>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Standard base64 encoding of the image bytes
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

/// A single-turn generation request; no conversation history is carried
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Full prompt text
    pub prompt: String,
    /// Optional image for vision models
    pub image: Option<ImageInput>,
}

impl GenerationRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: ImageInput) -> Self {
        self.image = Some(image);
        self
    }
}

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `GeminiClient`: hosted Gemini model (gemini-2.0-flash-lite)
/// - `OllamaLlm`: local Ollama server
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate text for a request; blank output is an error
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
