//! Offline embedding provider built from hashed character trigrams.

use crate::embeddings::{normalize, provider::EmbeddingProvider};
use helpdesk_core::AppResult;
use std::collections::HashMap;

/// Words too common to carry meaning for retrieval.
const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "how", "do", "does", "can", "you", "your", "what",
];

/// Deterministic, content-aware embeddings without a model server.
///
/// Every kept word contributes its character trigrams (weighted by the
/// square root of its frequency) and the whole word (weighted by its
/// frequency) to hashed buckets. The result is unit length, or all zeros
/// when the text has no usable words.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];

        for (word, freq) in word_frequencies(text) {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let bucket = self.bucket(window.iter().collect::<String>().as_bytes(), 37);
                vector[bucket] += (freq as f32).sqrt();
            }

            let bucket = self.bucket(word.as_bytes(), 31);
            vector[bucket] += freq as f32;
        }

        normalize(&mut vector);
        vector
    }

    fn bucket(&self, bytes: &[u8], multiplier: u64) -> usize {
        let hash = bytes.iter().fold(0u64, |acc, b| {
            acc.wrapping_mul(multiplier).wrapping_add(u64::from(*b))
        });
        (hash % self.dimensions as u64) as usize
    }
}

/// Lower-cased words longer than two characters, minus stop words, with counts.
fn word_frequencies(text: &str) -> HashMap<String, u32> {
    let mut freq = HashMap::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
    {
        *freq.entry(word.to_string()).or_insert(0) += 1;
    }
    freq
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::dot;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_trigram_embed_unit_length() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("reset the router password").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_trigram_deterministic() {
        let provider = TrigramProvider::new(128);
        let a = provider.embed("printer offline").await.unwrap();
        let b = provider.embed("printer offline").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_trigram_stop_words_only_is_zero() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("the and of it").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_trigram_related_text_scores_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed("vpn connection drops").await.unwrap();
        let related = provider
            .embed("If the VPN connection drops, restart the VPN client.")
            .await
            .unwrap();
        let unrelated = provider
            .embed("Expense reports are due on the fifth of each month.")
            .await
            .unwrap();

        assert!(dot(&query, &related) > dot(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_trigram_utf8_safety() {
        let provider = TrigramProvider::new(384);
        let embedding = provider
            .embed("Gamedex é um aplicativo 🎮 brasileiro para gerenciar jogos!")
            .await
            .unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_trigram_batch_preserves_order() {
        let provider = TrigramProvider::new(256);
        let texts = vec!["alpha network".to_string(), "beta storage".to_string()];
        let batch = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], provider.embed("beta storage").await.unwrap());
    }
}
