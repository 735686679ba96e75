//! Error types for the doubt-rag system

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for doubt-rag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message surfaced to HTTP callers when the language model gives no usable answer
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to get response from AI model";

/// doubt-rag errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// No reader matched the document and it is not readable as text
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// I/O or parse failure on a single document
    #[error("Failed to read '{filename}': {message}")]
    ReadFailure { filename: String, message: String },

    /// Embedding model call failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vectors of inconsistent length
    #[error("Dimension mismatch at position {position}: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        position: usize,
    },

    /// Language model call failed or returned no text
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Bad request from the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a read failure error
    pub fn read_failure(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ReadFailure {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Error::ReadFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Embedding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::DimensionMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to HTTP callers
    pub fn public_message(&self) -> String {
        match self {
            Error::Generation(_) => GENERATION_FAILED_MESSAGE.to_string(),
            Error::InvalidInput(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl From<MultipartRejection> for Error {
    fn from(rejection: MultipartRejection) -> Self {
        Self::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}
