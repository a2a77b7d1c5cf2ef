//! Retrieval engine for the helpdesk.
//!
//! Documents in the raw directory are split into word windows, embedded,
//! and stored in a SQLite index. The [`Retriever`] loads that index into
//! memory and answers top-k queries; the [`FeedbackLog`] and [`metrics`]
//! module measure how well it ranks the files users say are correct.

pub mod chunker;
pub mod corpus;
pub mod embeddings;
pub mod feedback;
pub mod index;
pub mod ingest;
pub mod metrics;
pub mod retriever;
pub mod types;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use feedback::{FeedbackLog, FeedbackRecord};
pub use ingest::{ingest, IngestOptions};
pub use metrics::MetricsSummary;
pub use retriever::Retriever;
pub use types::{ChunkRecord, Hit, IngestStats};

use helpdesk_core::{AppConfig, AppError, AppResult};

/// Build the configured embedding provider and load the index with it.
pub async fn load_retriever(config: &AppConfig) -> AppResult<Retriever> {
    let provider = create_provider(&config.embedding).await?;
    let index_path = config.index_path();

    tokio::task::spawn_blocking(move || Retriever::open(&index_path, provider))
        .await
        .map_err(|e| AppError::Index(format!("Index loader panicked: {}", e)))?
}

/// Rebuild the index from the raw directory and load a retriever over it.
pub async fn rebuild(config: &AppConfig) -> AppResult<(IngestStats, Retriever)> {
    let provider = create_provider(&config.embedding).await?;
    let stats = ingest(&IngestOptions::from_config(config), provider).await?;
    let retriever = load_retriever(config).await?;
    Ok((stats, retriever))
}
