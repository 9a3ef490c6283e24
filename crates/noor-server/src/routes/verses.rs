//! Verse routes: seed import and lookup.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use noor_core::Error;
use noor_store::VerseSeed;
use tracing::{info, warn};

use super::error_response;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/verses/import", post(import_verses))
        .route("/verses/{id}", get(get_verse))
}

/// POST /api/verses/import: insert seed verses, then rebuild the search index.
async fn import_verses(
    State(state): State<Arc<AppState>>,
    Json(seeds): Json<Vec<VerseSeed>>,
) -> Response {
    let report = match state.store.import_verses(seeds) {
        Ok(report) => report,
        Err(e) => {
            warn!("Verse import rejected: {}", e);
            return error_response(&e);
        }
    };

    if report.inserted > 0 {
        let task_state = state.clone();
        match tokio::task::spawn_blocking(move || task_state.search.rebuild()).await {
            Ok(Ok(status)) => info!(
                "Index rebuilt after import: {} verses",
                status.indexed_verses
            ),
            Ok(Err(e)) => {
                // Verses are committed; drop the stale index so the next search retries.
                warn!("Index rebuild after import failed: {}", e);
                state.search.invalidate();
            }
            Err(e) => {
                warn!("Index rebuild task panicked: {}", e);
                state.search.invalidate();
            }
        }
    }

    (StatusCode::CREATED, Json(report)).into_response()
}

/// GET /api/verses/{id}
async fn get_verse(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.store.get_verse(&id) {
        Ok(Some(verse)) => Json(verse).into_response(),
        Ok(None) => error_response(&Error::NotFound(format!("verse {}", id))),
        Err(e) => error_response(&e),
    }
}
