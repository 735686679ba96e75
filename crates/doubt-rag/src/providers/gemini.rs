//! Gemini API providers: text generation and embeddings
//!
//! Both talk to the Generative Language REST API with the key sent in the
//! `x-goog-api-key` header. Each generation call is a fresh single-turn
//! conversation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::embedding::EmbeddingProvider;
use super::llm::{GenerationRequest, LlmProvider};
use crate::config::{EmbeddingConfig, GeminiConfig, LlmConfig};
use crate::error::{Error, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";

fn api_key(config: &GeminiConfig) -> Result<String> {
    config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| Error::Config("Gemini API key is not configured".to_string()))
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

// ============================================================================
// Generation
// ============================================================================

/// Gemini text and vision generation client
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    config: LlmConfig,
}

impl GeminiClient {
    /// Create a new Gemini client; fails without an API key
    pub fn new(gemini: &GeminiConfig, config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            http: super::http_client(config.timeout_secs)?,
            api_key: api_key(gemini)?,
            base_url: gemini.base_url.trim_end_matches('/').to_string(),
            config: config.clone(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.config.model)
    }

    fn build_request(&self, request: &GenerationRequest) -> GenerateRequest {
        let mut parts = vec![Part::Text(request.prompt.clone())];
        if let Some(image) = &request.image {
            parts.push(Part::InlineData(InlineData {
                mime_type: image.mime_type.clone(),
                data: image.base64(),
            }));
        }

        GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
                top_k: self.config.top_k,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let body = self.build_request(request);

        let response = self
            .http
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::generation(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::generation(format!(
                "Gemini generation failed ({}): {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("Failed to parse Gemini response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::generation("No text in Gemini response"));
        }
        Ok(text)
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .http
            .get(format!("{}/models/{}", self.base_url, self.config.model))
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

// ============================================================================
// Embeddings
// ============================================================================

/// Gemini embedding provider (text-embedding-004, 768 dimensions)
pub struct GeminiEmbedder {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder; fails without an API key
    pub fn new(gemini: &GeminiConfig, config: &EmbeddingConfig, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            http: super::http_client(timeout_secs)?,
            api_key: api_key(gemini)?,
            base_url: gemini.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, self.model, method)
    }

    fn embed_request(&self, text: &str) -> EmbedRequest {
        EmbedRequest {
            model: format!("models/{}", self.model),
            content: Content {
                role: None,
                parts: vec![Part::Text(text.to_string())],
            },
        }
    }

    fn check_dimensions(&self, values: &[f32]) -> Result<()> {
        if values.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "{} returned {} dimensions, expected {}",
                self.model,
                values.len(),
                self.dimensions
            )));
        }
        Ok(())
    }

    async fn post<B: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<R> {
        let response = self
            .http
            .post(self.endpoint(method))
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Gemini {} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::embedding(format!(
                "Gemini {} failed ({}): {}",
                method, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse Gemini {} response: {}", method, e)))
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response: EmbedResponse = self.post("embedContent", &self.embed_request(text)).await?;
        self.check_dimensions(&response.embedding.values)?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let request = BatchEmbedRequest {
                requests: chunk.iter().map(|t| self.embed_request(t)).collect(),
            };
            let response: BatchEmbedResponse = self.post("batchEmbedContents", &request).await?;

            if response.embeddings.len() != chunk.len() {
                return Err(Error::embedding(format!(
                    "Gemini returned {} embeddings for {} texts",
                    response.embeddings.len(),
                    chunk.len()
                )));
            }
            for embedding in response.embeddings {
                self.check_dimensions(&embedding.values)?;
                all_embeddings.push(embedding.values);
            }
        }

        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.embed("health check").await.is_ok())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
