//! Answer generation
//!
//! Retrieval is always decided by the caller: `answer` receives the context
//! chunks (or `None`) and never infers them from the bot mode.

use std::sync::Arc;

use super::citation::{citations_from, SNIPPET_LEN};
use super::prompt::PromptBuilder;
use crate::error::{Error, Result};
use crate::providers::{GenerationRequest, ImageInput, LlmProvider};
use crate::retrieval::ScoredChunk;
use crate::types::{Answer, BotMode};

/// Turns questions (and optional context or image) into answers
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    snippet_len: usize,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            snippet_len: SNIPPET_LEN,
        }
    }

    /// Answer a question, optionally grounded on retrieved chunks
    pub async fn answer(
        &self,
        question: &str,
        mode: BotMode,
        context: Option<&[ScoredChunk]>,
    ) -> Result<Answer> {
        let prompt = PromptBuilder::build(mode, question, context);
        let text = self.generate(GenerationRequest::text(prompt)).await?;

        Ok(Answer {
            text,
            mode,
            citations: context
                .map(|chunks| citations_from(chunks, self.snippet_len))
                .unwrap_or_default(),
        })
    }

    /// Answer a question about an image (vision request)
    pub async fn answer_image(
        &self,
        question: &str,
        mode: BotMode,
        image: ImageInput,
    ) -> Result<Answer> {
        let prompt = PromptBuilder::persona_prompt(mode, question);
        let text = self
            .generate(GenerationRequest::text(prompt).with_image(image))
            .await?;

        Ok(Answer {
            text,
            mode,
            citations: Vec::new(),
        })
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String> {
        let text = self.llm.generate(&request).await.map_err(|e| {
            tracing::error!("{} generation failed: {}", self.llm.name(), e);
            match e {
                Error::Generation(_) => e,
                other => Error::generation(other.to_string()),
            }
        })?;

        if text.trim().is_empty() {
            tracing::error!("{} returned an empty answer", self.llm.name());
            return Err(Error::generation("Model returned no text"));
        }
        Ok(text)
    }
}
