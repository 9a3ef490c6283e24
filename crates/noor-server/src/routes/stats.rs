//! Stats route.

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/stats", get(get_stats))
}

/// GET /api/stats: corpus, audit trail, and index statistics.
async fn get_stats(State(state): State<Arc<AppState>>) -> Response {
    let store_stats = match state.store.get_stats() {
        Ok(stats) => stats,
        Err(e) => return error_response(&e),
    };
    let index = state.search.index_status();

    Json(serde_json::json!({
        "verses": store_stats.total_verses,
        "questions": store_stats.total_questions,
        "referenceLinks": store_stats.total_reference_links,
        "dbSizeMb": store_stats.db_size_mb,
        "topK": state.search.settings().top_k,
        "recordUnanswered": state.search.settings().record_unanswered,
        "index": index,
    }))
    .into_response()
}
