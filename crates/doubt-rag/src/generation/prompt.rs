//! Prompt templates for each bot mode

use crate::retrieval::ScoredChunk;
use crate::types::BotMode;

/// Question used for an upload that carries no question of its own
pub const DEFAULT_UPLOAD_REQUEST: &str = "please summarize the key points";

/// Prompt builder for doubt-solving questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Persona prompt for a mode, with the question appended
    pub fn persona_prompt(mode: BotMode, question: &str) -> String {
        match mode {
            BotMode::Normal => format!(
                "As a helpful assistant, please answer this question: {}",
                question
            ),
            BotMode::Career => format!(
                "As a career guidance expert, please provide advice on this question: {}",
                question
            ),
            BotMode::Math => format!(
                "As a math tutor, please solve this problem step by step, using LaTeX formatting \
                 for equations when appropriate. For inline equations, use $equation$ format. \
                 For block equations, use $$equation$$ format: {}",
                question
            ),
            BotMode::General => format!("Please answer this question: {}", question),
        }
    }

    /// Full prompt; when context is given the persona prompt follows numbered excerpts
    pub fn build(mode: BotMode, question: &str, context: Option<&[ScoredChunk]>) -> String {
        let persona = Self::persona_prompt(mode, question);
        match context {
            Some(chunks) if !chunks.is_empty() => format!(
                "Use the numbered excerpts below from the student's documents to answer. \
                 Refer to an excerpt by its number when you rely on it. If the excerpts do not \
                 contain the answer, say so before answering from general knowledge.\n\n\
                 CONTEXT:\n{}\n{}",
                Self::build_context(chunks),
                persona
            ),
            _ => persona,
        }
    }

    /// Numbered context blocks: `[n] filename (chunk i)` followed by the chunk text
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        let mut context = String::new();
        for (i, result) in chunks.iter().enumerate() {
            context.push_str(&format!(
                "[{}] {}\n{}\n---\n",
                i + 1,
                result.chunk.label(),
                result.chunk.content
            ));
        }
        context
    }

    /// Question sent for a document upload
    pub fn upload_question(request: Option<&str>) -> String {
        let request = request
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_REQUEST);
        format!("Based on the uploaded document, {}", request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextChunk;
    use uuid::Uuid;

    fn scored(source: &str, index: usize, content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: TextChunk {
                id: Uuid::new_v4(),
                document_id: Uuid::new_v4(),
                source: source.to_string(),
                index,
                char_offset: 0,
                char_len: content.len(),
                content: content.to_string(),
            },
            similarity: 0.9,
        }
    }

    #[test]
    fn test_math_template() {
        let prompt = PromptBuilder::build(BotMode::Math, "integrate x^2", None);
        assert!(prompt.starts_with("As a math tutor, please solve this problem step by step"));
        assert!(prompt.contains("$$equation$$"));
        assert!(prompt.ends_with(": integrate x^2"));
    }

    #[test]
    fn test_mode_templates() {
        assert_eq!(
            PromptBuilder::persona_prompt(BotMode::Normal, "q"),
            "As a helpful assistant, please answer this question: q"
        );
        assert_eq!(
            PromptBuilder::persona_prompt(BotMode::Career, "q"),
            "As a career guidance expert, please provide advice on this question: q"
        );
        assert_eq!(
            PromptBuilder::persona_prompt(BotMode::General, "q"),
            "Please answer this question: q"
        );
    }

    #[test]
    fn test_context_blocks_are_numbered() {
        let chunks = vec![
            scored("bio.pdf", 0, "Cells divide."),
            scored("bio.pdf", 3, "DNA replicates."),
        ];
        let prompt = PromptBuilder::build(BotMode::Normal, "How do cells divide?", Some(chunks.as_slice()));
        assert!(prompt.contains("[1] bio.pdf (chunk 1)\nCells divide."));
        assert!(prompt.contains("[2] bio.pdf (chunk 4)\nDNA replicates."));
        assert!(prompt.ends_with("please answer this question: How do cells divide?"));
    }

    #[test]
    fn test_empty_context_is_plain_prompt() {
        let prompt = PromptBuilder::build(BotMode::Normal, "q", Some(&[][..]));
        assert_eq!(prompt, PromptBuilder::persona_prompt(BotMode::Normal, "q"));
    }

    #[test]
    fn test_upload_question() {
        assert_eq!(
            PromptBuilder::upload_question(None),
            "Based on the uploaded document, please summarize the key points"
        );
        assert_eq!(
            PromptBuilder::upload_question(Some("  ")),
            "Based on the uploaded document, please summarize the key points"
        );
        assert_eq!(
            PromptBuilder::upload_question(Some("what is osmosis?")),
            "Based on the uploaded document, what is osmosis?"
        );
    }
}
