//! Feedback capture and metrics handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use helpdesk_knowledge::{FeedbackRecord, MetricsSummary};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{validate_k, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub question: String,
    pub answer_file: String,
    #[serde(default = "default_k")]
    pub k: u32,
    #[serde(default = "default_persist")]
    pub persist: bool,
}

fn default_k() -> u32 {
    5
}

fn default_persist() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub rank: Option<u32>,
    pub hit_at_k: bool,
    pub saved: bool,
}

#[derive(Debug, Deserialize)]
pub struct MetricsParams {
    #[serde(default = "default_k")]
    pub k: u32,
}

/// POST /feedback - find where `answer_file` ranks for `question` and log it.
pub async fn feedback(
    State(state): State<AppState>,
    payload: Result<Json<FeedbackRequest>, JsonRejection>,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let Json(req) = payload?;
    let k = validate_k(req.k)?;
    let retriever = state.retriever().await?;

    let rank = retriever.rank_of(&req.question, &req.answer_file, k).await?;

    if req.persist {
        let record = FeedbackRecord::new(req.question, req.answer_file, req.k, rank);
        state.feedback.append_async(record).await?;
    }

    Ok(Json(FeedbackResponse {
        rank,
        hit_at_k: rank.is_some_and(|r| r <= req.k),
        saved: req.persist,
    }))
}

/// GET /metrics?k=5 - hit@k, MRR and nDCG@k over all logged feedback.
pub async fn metrics(
    State(state): State<AppState>,
    params: Result<Query<MetricsParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params?;
    if params.k == 0 {
        return Err(ApiError::unprocessable("k must be at least 1"));
    }

    // A missing log reads as NotFound, which renders as 404.
    let ranks = state.feedback.ranks_async().await?;
    Ok(Json(MetricsSummary::compute(&ranks, params.k).to_json()))
}
