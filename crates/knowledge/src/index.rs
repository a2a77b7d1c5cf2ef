//! SQLite-backed chunk index.
//!
//! One table holds chunk text and little-endian `f32` embedding blobs, a
//! second records which embedding model built the index.

use crate::types::{ChunkRecord, IndexIdentity};
use chrono::Utc;
use helpdesk_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// An open index database.
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Create (or open) an index at `db_path`, creating tables as needed.
    pub fn create(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Index(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id INTEGER PRIMARY KEY,
                file TEXT NOT NULL,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS index_meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_file ON chunks(file);
            "#,
        )
        .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Initialized SQLite index at {:?}", db_path);
        Ok(Self { conn })
    }

    /// Open an existing index; a missing file is an error.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if !db_path.exists() {
            return Err(AppError::NotFound(
                "Index not found. Run `helpdesk ingest` first.".to_string(),
            ));
        }
        Self::create(db_path)
    }

    /// Record the embedding model used to build this index.
    pub fn write_identity(&self, identity: &IndexIdentity) -> AppResult<()> {
        let entries = [
            ("provider", identity.provider.clone()),
            ("model", identity.model.clone()),
            ("dimensions", identity.dimensions.to_string()),
            ("built_at", Utc::now().to_rfc3339()),
        ];
        for (key, value) in entries {
            self.conn.execute(
                "INSERT OR REPLACE INTO index_meta (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }
        Ok(())
    }

    /// Read the embedding model identity, if one was recorded.
    pub fn identity(&self) -> AppResult<Option<IndexIdentity>> {
        let provider = self.meta("provider")?;
        let model = self.meta("model")?;
        let dimensions = self.meta("dimensions")?;

        match (provider, model, dimensions) {
            (Some(provider), Some(model), Some(dimensions)) => {
                let dimensions = dimensions.parse().map_err(|e| {
                    AppError::Index(format!("Corrupt dimensions '{}': {}", dimensions, e))
                })?;
                Ok(Some(IndexIdentity {
                    provider,
                    model,
                    dimensions,
                }))
            }
            _ => Ok(None),
        }
    }

    /// When the index was last built (RFC 3339), if recorded.
    pub fn built_at(&self) -> AppResult<Option<String>> {
        self.meta("built_at")
    }

    fn meta(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM index_meta WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Insert a batch of chunks in a single transaction.
    pub fn insert_chunks(&mut self, chunks: &[ChunkRecord]) -> AppResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO chunks (file, position, text, embedding) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for chunk in chunks {
                stmt.execute(params![
                    chunk.file,
                    i64::from(chunk.position),
                    chunk.text,
                    embedding_to_bytes(&chunk.embedding),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load every chunk in insertion order.
    pub fn load_chunks(&self) -> AppResult<Vec<ChunkRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT file, position, text, embedding FROM chunks ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Vec<u8>>(3)?,
            ))
        })?;

        let mut chunks = Vec::new();
        for row in rows {
            let (file, position, text, blob) = row?;
            chunks.push(ChunkRecord {
                file,
                position: u32::try_from(position)
                    .map_err(|_| AppError::Index(format!("Invalid chunk position {}", position)))?,
                text,
                embedding: bytes_to_embedding(&blob)?,
            });
        }

        tracing::debug!("Loaded {} chunks from index", chunks.len());
        Ok(chunks)
    }
}

/// Convert an embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert stored bytes back to an embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(file: &str, position: u32, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            file: file.to_string(),
            position,
            text: format!("{} chunk {}", file, position),
            embedding,
        }
    }

    #[test]
    fn test_open_missing_index() {
        let temp = TempDir::new().unwrap();
        let result = IndexStore::open(&temp.path().join("index.sqlite"));
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_insert_and_load_preserves_order() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index").join("index.sqlite");
        let mut store = IndexStore::create(&path).unwrap();

        store
            .insert_chunks(&[
                chunk("vpn.txt", 0, vec![1.0, 0.0]),
                chunk("vpn.txt", 1, vec![0.0, 1.0]),
                chunk("email.txt", 0, vec![0.6, 0.8]),
            ])
            .unwrap();

        let reopened = IndexStore::open(&path).unwrap();
        let loaded = reopened.load_chunks().unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[2].file, "email.txt");
        assert_eq!(loaded[1].embedding, vec![0.0, 1.0]);
    }

    #[test]
    fn test_identity_roundtrip() {
        let temp = TempDir::new().unwrap();
        let store = IndexStore::create(&temp.path().join("index.sqlite")).unwrap();
        assert!(store.identity().unwrap().is_none());

        let identity = IndexIdentity {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
        };
        store.write_identity(&identity).unwrap();

        assert_eq!(store.identity().unwrap(), Some(identity));
        assert!(store.built_at().unwrap().is_some());
    }

    #[test]
    fn test_bytes_to_embedding_rejects_partial_floats() {
        assert!(bytes_to_embedding(&[0, 0, 128]).is_err());
    }
}
