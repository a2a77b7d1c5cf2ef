//! Index inspection and rebuild handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use helpdesk_core::AppError;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReindexResponse {
    pub status: &'static str,
    pub message: String,
    pub documents: u32,
    pub chunks: u32,
}

/// GET /healthz
pub async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let retriever = state.retriever().await.ok();
    Json(json!({
        "status": "ok",
        "retriever_ready": retriever.is_some(),
        "chunks": retriever.as_ref().map(|r| r.len()).unwrap_or(0),
        "index_built_at": retriever.as_ref().and_then(|r| r.built_at()),
    }))
}

/// GET /files - sorted names of every indexed file.
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FilesResponse>, ApiError> {
    let retriever = state.retriever().await?;
    Ok(Json(FilesResponse {
        files: retriever.files().to_vec(),
    }))
}

/// POST /reindex - rebuild the index from the raw directory and swap it in.
///
/// Only one rebuild runs at a time; a concurrent request gets 409. The
/// rebuild runs in its own task holding the lock, so a client that hangs up
/// does not free the lock while the build is still writing.
pub async fn reindex(State(state): State<AppState>) -> Result<Json<ReindexResponse>, ApiError> {
    let guard = state
        .reindex_lock
        .clone()
        .try_lock_owned()
        .map_err(|_| ApiError::new(StatusCode::CONFLICT, "Reindex already in progress."))?;

    tracing::info!("Reindex requested");

    let task_state = state.clone();
    let build = tokio::spawn(async move {
        let _guard = guard;
        let (stats, retriever) = helpdesk_knowledge::rebuild(&task_state.config).await?;
        task_state.replace_retriever(retriever).await;
        Ok::<_, AppError>(stats)
    });

    let stats = build
        .await
        .map_err(|e| AppError::Index(format!("Reindex task panicked: {}", e)))
        .and_then(|result| result)
        .map_err(|e| {
            tracing::error!("Reindex failed: {}", e);
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Reindex failed: {}", e),
            )
        })?;

    Ok(Json(ReindexResponse {
        status: "ok",
        message: "Index rebuilt and retriever reloaded.".to_string(),
        documents: stats.documents,
        chunks: stats.chunks,
    }))
}
