//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source document read from the raw directory.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name, used as the document id in hits and feedback
    pub file: String,

    /// Full path on disk
    pub path: PathBuf,

    /// UTF-8 text content
    pub text: String,
}

/// A chunk of a document as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Source file name
    pub file: String,

    /// Position of the chunk within its file
    pub position: u32,

    /// Chunk text (words joined by single spaces)
    pub text: String,

    /// Unit-norm embedding vector
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A single retrieval result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// 1-based rank within the result list
    pub rank: u32,

    /// Similarity to the query (dot product of unit vectors)
    pub score: f32,

    /// Source file name
    pub file: String,

    /// Chunk text
    pub text: String,
}

/// Statistics from an ingest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestStats {
    /// Number of documents read
    pub documents: u32,

    /// Number of chunks written to the index
    pub chunks: u32,

    /// Total bytes of document text
    pub bytes: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Identity of the embedding model an index was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexIdentity {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}
