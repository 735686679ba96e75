//! API routes for the doubt-rag server

pub mod chatbot;
pub mod index;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Questions
        .route("/chatbot/askdoubt", post(chatbot::ask_doubt))
        // Uploads - with larger body limit for files
        .route(
            "/chatbot/upload",
            post(chatbot::upload).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/chatbot/extract",
            post(chatbot::extract).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/chatbot/history", get(chatbot::history))
        // Index
        .route("/index", get(index::index_stats).delete(index::reset_index))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "doubt-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Study assistant with document uploads and grounded answers",
        "endpoints": {
            "POST /api/chatbot/askdoubt": "Ask a question (botType: normal, career, math)",
            "POST /api/chatbot/upload": "Upload documents and ask about them",
            "POST /api/chatbot/extract": "Extract plain text from a document",
            "GET /api/chatbot/history": "Sample chat history",
            "GET /api/index": "Index statistics",
            "DELETE /api/index": "Clear the index"
        },
        "formats": [
            "pdf", "docx", "txt", "csv", "json", "xml", "yaml",
            "xls", "xlsx", "pptx", "html"
        ]
    }))
}
