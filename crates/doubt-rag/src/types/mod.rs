//! Core types for the doubt-rag system

pub mod document;
pub mod query;
pub mod response;

pub use document::{DetectionMethod, Document, DocumentFormat, ExtractedText, TextChunk};
pub use query::{AskRequest, BotMode};
pub use response::{
    Answer, AnswerData, ApiResponse, Citation, ExtractData, HistoryEntry, IndexStats,
    IndexedDocument, IngestFailure,
};
