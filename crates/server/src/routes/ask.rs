//! Question answering handlers.

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use helpdesk_knowledge::Hit;
use serde::{Deserialize, Serialize};

use crate::error::{validate_k, ApiError};
use crate::state::AppState;

/// Longest answer, in characters, stitched from the retrieved contexts.
pub const MAX_ANSWER_CHARS: usize = 1000;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_k")]
    pub k: u32,
}

fn default_k() -> u32 {
    3
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub contexts: Vec<Hit>,
    pub latency_ms: u64,
}

/// POST /ask
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(req) = payload?;
    answer(&state, req).await
}

/// GET /ask?question=...&k=... for quick checks from a browser address bar.
pub async fn ask_get(
    State(state): State<AppState>,
    params: Result<Query<AskRequest>, QueryRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Query(req) = params?;
    answer(&state, req).await
}

async fn answer(state: &AppState, req: AskRequest) -> Result<Json<AskResponse>, ApiError> {
    let k = validate_k(req.k)?;
    let retriever = state.retriever().await?;

    let start = Instant::now();
    let contexts = retriever.search(&req.question, k).await?;
    let latency_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        "Answered question with {} contexts in {}ms",
        contexts.len(),
        latency_ms
    );

    Ok(Json(AskResponse {
        answer: stitch_answer(&contexts),
        contexts,
        latency_ms,
    }))
}

/// Join the context texts with spaces and cut to [`MAX_ANSWER_CHARS`].
pub fn stitch_answer(hits: &[Hit]) -> String {
    hits.iter()
        .map(|h| h.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_ANSWER_CHARS)
        .collect()
}
