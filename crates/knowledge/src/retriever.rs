//! In-memory dense retriever over a loaded index.

use crate::embeddings::{dot, normalize, EmbeddingProvider};
use crate::index::IndexStore;
use crate::types::{ChunkRecord, Hit};
use helpdesk_core::{AppError, AppResult};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

/// Exhaustive dot-product search over every chunk vector.
///
/// Chunk vectors are unit length, so the dot product with a normalized query
/// is the cosine similarity.
#[derive(Debug)]
pub struct Retriever {
    chunks: Vec<ChunkRecord>,
    files: Vec<String>,
    provider: Arc<dyn EmbeddingProvider>,
    built_at: Option<String>,
}

impl Retriever {
    /// Load every chunk from the index at `index_path`.
    ///
    /// Fails when the index is missing or was built by a different
    /// embedding model than `provider`.
    pub fn open(index_path: &Path, provider: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let store = IndexStore::open(index_path)?;

        if let Some(built_with) = store.identity()? {
            let configured = provider.identity();
            if built_with != configured {
                return Err(AppError::Index(format!(
                    "Index was built with {}/{} ({} dims) but {}/{} ({} dims) is configured. Re-run ingest.",
                    built_with.provider,
                    built_with.model,
                    built_with.dimensions,
                    configured.provider,
                    configured.model,
                    configured.dimensions
                )));
            }
        }

        let chunks = store.load_chunks()?;
        tracing::info!("Retriever loaded {} chunks from {:?}", chunks.len(), index_path);
        Ok(Self {
            built_at: store.built_at()?,
            ..Self::from_chunks(chunks, provider)
        })
    }

    /// Build a retriever from chunks already in memory.
    pub fn from_chunks(chunks: Vec<ChunkRecord>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        let files = chunks
            .iter()
            .map(|c| c.file.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Self {
            chunks,
            files,
            provider,
            built_at: None,
        }
    }

    /// Sorted, de-duplicated names of the indexed files.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// When the loaded index was built (RFC 3339), if it was read from disk.
    pub fn built_at(&self) -> Option<&str> {
        self.built_at.as_deref()
    }

    /// Return the `min(k, len)` best chunks for `query`, best first.
    ///
    /// Equal scores keep index order. Ranks start at 1.
    pub async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Hit>> {
        let mut query_vector = self.provider.embed(query).await?;
        normalize(&mut query_vector);

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| (i, dot(&query_vector, &chunk.embedding)))
            .collect();

        // NaN scores (from a misbehaving provider) rank last.
        for entry in &mut scored {
            if entry.1.is_nan() {
                entry.1 = f32::NEG_INFINITY;
            }
        }
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let hits: Vec<Hit> = scored
            .into_iter()
            .enumerate()
            .map(|(i, (idx, score))| {
                let chunk = &self.chunks[idx];
                Hit {
                    rank: i as u32 + 1,
                    score,
                    file: chunk.file.clone(),
                    text: chunk.text.clone(),
                }
            })
            .collect();

        tracing::debug!(
            "Search returned {} hits (requested top-{}, top score {:.3})",
            hits.len(),
            k,
            hits.first().map(|h| h.score).unwrap_or(0.0)
        );

        Ok(hits)
    }

    /// Rank (1-based) of the first hit from `file` in the top `k` for `query`.
    pub async fn rank_of(&self, query: &str, file: &str, k: usize) -> AppResult<Option<u32>> {
        let hits = self.search(query, k).await?;
        Ok(hits.iter().find(|h| h.file == file).map(|h| h.rank))
    }
}
