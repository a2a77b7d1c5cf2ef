//! Index build pipeline: documents → word chunks → embeddings → SQLite.

use crate::chunker::chunk_words;
use crate::corpus::load_documents;
use crate::embeddings::{normalize, EmbeddingProvider};
use crate::index::IndexStore;
use crate::types::{ChunkRecord, IngestStats};
use helpdesk_core::config::{AppConfig, ChunkingConfig};
use helpdesk_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Where to read documents from and where to write the index.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub raw_dir: PathBuf,
    pub index_path: PathBuf,
    pub chunking: ChunkingConfig,
    pub batch_size: usize,
}

impl IngestOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            raw_dir: config.raw_dir(),
            index_path: config.index_path(),
            chunking: config.chunking,
            batch_size: config.embedding.batch_size,
        }
    }
}

/// Rebuild the index from scratch.
///
/// The new index is written next to the old one and renamed into place only
/// after every chunk is stored, so a failed run leaves the previous index
/// untouched.
pub async fn ingest(
    options: &IngestOptions,
    provider: Arc<dyn EmbeddingProvider>,
) -> AppResult<IngestStats> {
    let start = Instant::now();

    tracing::info!("Starting ingest from {:?}", options.raw_dir);

    let documents = load_documents(&options.raw_dir)?;
    if documents.is_empty() {
        return Err(AppError::NotFound(format!(
            "No .txt docs in {}",
            options.raw_dir.display()
        )));
    }

    let mut records = Vec::new();
    let mut bytes = 0u64;
    for doc in &documents {
        bytes += doc.text.len() as u64;
        for (position, text) in chunk_words(&doc.text, options.chunking.size, options.chunking.overlap)
            .into_iter()
            .enumerate()
        {
            records.push(ChunkRecord {
                file: doc.file.clone(),
                position: position as u32,
                text,
                embedding: Vec::new(),
            });
        }
    }

    tracing::info!(
        "Embedding {} chunks from {} documents with {}/{}",
        records.len(),
        documents.len(),
        provider.provider_name(),
        provider.model_name()
    );

    for batch in records.chunks_mut(options.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
        let embeddings = provider.embed_batch(&texts).await?;
        if embeddings.len() != batch.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                batch.len()
            )));
        }
        for (record, mut embedding) in batch.iter_mut().zip(embeddings) {
            normalize(&mut embedding);
            record.embedding = embedding;
        }
    }

    let chunks = records.len() as u32;
    let index_path = options.index_path.clone();
    let identity = provider.identity();

    tokio::task::spawn_blocking(move || write_index(&index_path, &records, &identity))
        .await
        .map_err(|e| AppError::Index(format!("Index writer panicked: {}", e)))??;

    let duration = start.elapsed();

    tracing::info!(
        "Ingest completed: {} documents, {} chunks, {} bytes in {:.2}s",
        documents.len(),
        chunks,
        bytes,
        duration.as_secs_f64()
    );

    Ok(IngestStats {
        documents: documents.len() as u32,
        chunks,
        bytes,
        duration_secs: duration.as_secs_f64(),
    })
}

fn write_index(
    index_path: &Path,
    records: &[ChunkRecord],
    identity: &crate::types::IndexIdentity,
) -> AppResult<()> {
    let dir = index_path
        .parent()
        .ok_or_else(|| AppError::Index(format!("Index path has no directory: {:?}", index_path)))?;
    std::fs::create_dir_all(dir)?;

    // Each build stages into its own file; dropping it unbuilt removes it.
    let staging = tempfile::Builder::new()
        .prefix("index.")
        .suffix(".building")
        .tempfile_in(dir)?;

    {
        let mut store = IndexStore::create(staging.path())?;
        store.insert_chunks(records)?;
        store.write_identity(identity)?;
    }

    staging.persist(index_path).map_err(|e| {
        AppError::Index(format!(
            "Failed to move new index into place at {:?}: {}",
            index_path, e.error
        ))
    })?;

    tracing::debug!("Wrote {} chunks to {:?}", records.len(), index_path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use crate::retriever::Retriever;
    use tempfile::TempDir;

    fn options(root: &Path, size: usize, overlap: usize) -> IngestOptions {
        IngestOptions {
            raw_dir: root.join("raw"),
            index_path: root.join("index").join("index.sqlite"),
            chunking: ChunkingConfig { size, overlap },
            batch_size: 2,
        }
    }

    #[tokio::test]
    async fn test_ingest_without_documents_fails() {
        let temp = TempDir::new().unwrap();
        let provider = Arc::new(TrigramProvider::new(64));

        let err = ingest(&options(temp.path(), 10, 2), provider)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("No .txt docs in"));
    }

    #[tokio::test]
    async fn test_ingest_builds_searchable_index() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("raw");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(
            raw.join("vpn.txt"),
            "Connect to the VPN with the corporate client. If the VPN tunnel drops, reconnect.",
        )
        .unwrap();
        std::fs::write(
            raw.join("printer.txt"),
            "Printer jams: open tray two, remove paper, restart the printer spooler.",
        )
        .unwrap();

        let provider = Arc::new(TrigramProvider::new(256));
        let opts = options(temp.path(), 6, 2);
        let stats = ingest(&opts, provider.clone()).await.unwrap();

        assert_eq!(stats.documents, 2);
        assert!(stats.chunks >= 4);
        assert!(opts.index_path.exists());
        let leftovers: Vec<_> = std::fs::read_dir(temp.path().join("index"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, ["index.sqlite"]);

        let retriever = Retriever::open(&opts.index_path, provider).unwrap();
        assert_eq!(retriever.files(), ["printer.txt", "vpn.txt"]);

        let hits = retriever.search("printer spooler restart", 1).await.unwrap();
        assert_eq!(hits[0].file, "printer.txt");
    }

    #[tokio::test]
    async fn test_reingest_replaces_index() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("raw");
        std::fs::create_dir_all(&raw).unwrap();
        std::fs::write(raw.join("a.txt"), "alpha bravo charlie").unwrap();

        let provider = Arc::new(TrigramProvider::new(64));
        let opts = options(temp.path(), 10, 0);
        ingest(&opts, provider.clone()).await.unwrap();

        std::fs::write(raw.join("b.txt"), "delta echo foxtrot").unwrap();
        let stats = ingest(&opts, provider.clone()).await.unwrap();
        assert_eq!(stats.chunks, 2);

        let retriever = Retriever::open(&opts.index_path, provider).unwrap();
        assert_eq!(retriever.len(), 2);
    }

    #[tokio::test]
    async fn test_overlapping_ingests_each_stage_separately() {
        let temp = TempDir::new().unwrap();
        let raw = temp.path().join("raw");
        std::fs::create_dir_all(&raw).unwrap();
        for i in 0..20 {
            std::fs::write(raw.join(format!("doc{:02}.txt", i)), "reset the password from the portal")
                .unwrap();
        }

        let provider = Arc::new(TrigramProvider::new(64));
        let opts = options(temp.path(), 3, 1);
        let (first, second) = tokio::join!(
            ingest(&opts, provider.clone()),
            ingest(&opts, provider.clone())
        );
        assert_eq!(first.unwrap().chunks, second.unwrap().chunks);

        let retriever = Retriever::open(&opts.index_path, provider).unwrap();
        assert_eq!(retriever.files().len(), 20);
        assert_eq!(
            std::fs::read_dir(temp.path().join("index")).unwrap().count(),
            1
        );
    }
}
