//! Question audit routes: what was asked and which verses were cited.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use noor_core::Error;
use serde::Deserialize;

use super::error_response;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/questions", get(list_questions))
        .route("/questions/{id}", get(get_question).delete(delete_question))
}

#[derive(Deserialize)]
struct ListParams {
    limit: Option<usize>,
}

/// GET /api/questions: most recent questions.
async fn list_questions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    match state.store.list_questions(limit) {
        Ok(questions) => Json(serde_json::json!({
            "questions": questions,
            "total": questions.len(),
        }))
        .into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/questions/{id}: a question with its reference links.
async fn get_question(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.store.get_question(&id) {
        Ok(Some(question)) => Json(question).into_response(),
        Ok(None) => error_response(&Error::NotFound(format!("question {}", id))),
        Err(e) => error_response(&e),
    }
}

/// DELETE /api/questions/{id}: delete a question and its links.
async fn delete_question(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.store.delete_question(&id) {
        Ok(true) => Json(serde_json::json!({ "deleted": true, "id": id })).into_response(),
        Ok(false) => error_response(&Error::NotFound(format!("question {}", id))),
        Err(e) => error_response(&e),
    }
}
