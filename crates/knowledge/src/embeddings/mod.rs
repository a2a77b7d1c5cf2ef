//! Embedding providers for the retrieval index.
//!
//! Both ingest and query time go through the same [`EmbeddingProvider`], so
//! chunk and query vectors always live in the same space.

pub mod provider;
pub mod providers;

pub use helpdesk_core::config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

/// Small constant keeping zero vectors finite after normalization.
const NORM_EPSILON: f32 = 1e-12;

/// Scale a vector to unit length in place.
///
/// A zero vector stays zero.
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    for v in vector.iter_mut() {
        *v /= norm + NORM_EPSILON;
    }
}

/// Dot product of two equal-length vectors; mismatched lengths score zero.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
