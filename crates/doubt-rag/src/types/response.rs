//! Response types for the HTTP surface and the answer generator

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::DocumentFormat;
use super::query::BotMode;

/// JSON envelope used by every chatbot endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human readable message (always present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Failed response carrying a message
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Citation pointing at a retrieved chunk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Document ID
    pub document_id: Uuid,
    /// Source filename
    pub filename: String,
    /// Chunk index within the document
    pub chunk_index: usize,
    /// Cosine similarity to the question
    pub similarity: f32,
    /// Leading excerpt of the chunk
    pub snippet: String,
}

impl Citation {
    /// Format citation for display in text
    pub fn format_inline(&self) -> String {
        format!("[Source: {}, chunk {}]", self.filename, self.chunk_index + 1)
    }
}

/// A generated answer (never persisted)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated text
    pub text: String,
    /// Persona used
    pub mode: BotMode,
    /// Retrieved chunks used as context
    pub citations: Vec<Citation>,
}

/// A document that could not be ingested
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestFailure {
    /// Filename of the skipped document
    pub filename: String,
    /// Reason it was skipped
    pub error: String,
}

/// `data` of a successful askdoubt / upload response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerData {
    /// Generated answer text
    pub response: String,
    /// Citations (only when retrieval was used)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<Citation>,
    /// Uploaded files that were skipped
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<IngestFailure>,
    /// Uploaded documents added to the index
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub indexed: Vec<IndexedDocument>,
}

impl From<Answer> for AnswerData {
    fn from(answer: Answer) -> Self {
        Self {
            response: answer.text,
            citations: answer.citations,
            skipped: Vec::new(),
            indexed: Vec::new(),
        }
    }
}

/// `data` of a successful extract response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractData {
    pub filename: String,
    pub format: DocumentFormat,
    pub mime: String,
    pub text: String,
}

/// One entry of the chat history listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub title: String,
    pub timestamp: String,
    pub bot_type: BotMode,
}

/// A document present in the index
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexedDocument {
    /// Document ID
    pub document_id: Uuid,
    /// Original filename
    pub filename: String,
    /// Detected format
    pub format: DocumentFormat,
    /// SHA-256 of the raw content
    pub content_hash: String,
    /// Number of chunks indexed
    pub chunks: usize,
}

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total chunks in the index
    pub chunks: usize,
    /// Embedding dimensionality (0 when empty)
    pub dimensions: usize,
    /// Indexed documents
    pub documents: Vec<IndexedDocument>,
}
