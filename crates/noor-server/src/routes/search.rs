//! Search routes: ask a question, manage the search index.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use noor_search::IndexStatus;
use serde::Deserialize;
use tracing::error;

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", post(search))
        .route("/search/index", get(index_status))
        .route("/search/rebuild", post(rebuild_index))
}

#[derive(Deserialize)]
struct SearchRequest {
    query: Option<String>,
}

/// Raises the flag when the request future is dropped mid-search.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// POST /api/search: answer a question from the verse corpus.
async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Response {
    let Some(query) = req.query.filter(|q| !q.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Search query is required" })),
        )
            .into_response();
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let _guard = CancelOnDrop(cancel.clone());

    let task_state = state.clone();
    let result = tokio::task::spawn_blocking(move || {
        task_state.search.search_cancellable(&query, &cancel)
    })
    .await;

    match result {
        Ok(Ok(answer)) => Json(answer).into_response(),
        Ok(Err(e)) => {
            error!("Search failed: {}", e);
            error_response(&e)
        }
        Err(e) => {
            error!("Search task panicked: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Search task failed" })),
            )
                .into_response()
        }
    }
}

/// GET /api/search/index: memoized index state.
async fn index_status(State(state): State<Arc<AppState>>) -> Json<IndexStatus> {
    Json(state.search.index_status())
}

/// POST /api/search/rebuild: rebuild the index from the current corpus.
async fn rebuild_index(State(state): State<Arc<AppState>>) -> Response {
    let task_state = state.clone();
    match tokio::task::spawn_blocking(move || task_state.search.rebuild()).await {
        Ok(Ok(status)) => Json(status).into_response(),
        Ok(Err(e)) => {
            error!("Index rebuild failed: {}", e);
            error_response(&e)
        }
        Err(e) => {
            error!("Index rebuild task panicked: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
