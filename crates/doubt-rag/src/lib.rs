//! doubt-rag: study assistant service with document ingestion and grounded answers
//!
//! Students ask questions in one of several modes (general, career, math) or
//! upload documents and ask about them. Uploaded files of many formats are
//! read into plain text, split into overlapping chunks, embedded, and kept in
//! an in-memory vector index that answers are grounded on.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use types::{
    document::{Document, DocumentFormat, ExtractedText, TextChunk},
    query::{AskRequest, BotMode},
    response::{Answer, Citation},
};
