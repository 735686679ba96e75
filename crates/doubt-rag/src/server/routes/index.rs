//! Index inspection endpoints

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::{ApiResponse, IndexStats};

/// GET /api/index - Chunks, dimensionality and documents of the current index
pub async fn index_stats(State(state): State<AppState>) -> Json<ApiResponse<IndexStats>> {
    Json(ApiResponse::ok(state.stats()))
}

/// DELETE /api/index - Drop every indexed document
pub async fn reset_index(State(state): State<AppState>) -> Json<ApiResponse<IndexStats>> {
    state.reset_index();
    Json(ApiResponse::ok(state.stats()))
}
