//! Ranking metrics over feedback ranks.
//!
//! Each entry is the 1-based rank at which the correct file appeared, or
//! `None` when it was not retrieved. Every query counts toward the
//! denominator, found or not.

use serde::{Deserialize, Serialize};

/// Fraction of queries whose correct file ranked within `k`.
pub fn hit_at_k(ranks: &[Option<u32>], k: u32) -> f64 {
    let hits = ranks.iter().flatten().filter(|&&r| r <= k).count();
    hits as f64 / ranks.len().max(1) as f64
}

/// Mean reciprocal rank; misses contribute zero.
pub fn mrr(ranks: &[Option<u32>]) -> f64 {
    let total: f64 = ranks
        .iter()
        .flatten()
        .filter(|&&r| r > 0)
        .map(|&r| 1.0 / f64::from(r))
        .sum();
    total / ranks.len().max(1) as f64
}

/// Binary-relevance nDCG@k with one relevant file per query.
///
/// The ideal ranking puts that file first, so IDCG is `1 / log2(2) = 1`.
pub fn ndcg_at_k(ranks: &[Option<u32>], k: u32) -> f64 {
    let dcg: f64 = ranks
        .iter()
        .flatten()
        .filter(|&&r| r > 0 && r <= k)
        .map(|&r| 1.0 / (f64::from(r) + 1.0).log2())
        .sum();
    let idcg = 1.0 / 2f64.log2();
    (dcg / idcg.max(1e-12)) / ranks.len().max(1) as f64
}

/// Round to three decimals for display.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// All three metrics for one cut-off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub count: usize,
    pub k: u32,
    pub hit_at_k: f64,
    pub mrr: f64,
    pub ndcg_at_k: f64,
}

impl MetricsSummary {
    pub fn compute(ranks: &[Option<u32>], k: u32) -> Self {
        Self {
            count: ranks.len(),
            k,
            hit_at_k: hit_at_k(ranks, k),
            mrr: mrr(ranks),
            ndcg_at_k: ndcg_at_k(ranks, k),
        }
    }

    /// JSON object keyed by the cut-off, e.g. `{"count": 3, "hit@5": 0.667, ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("count".to_string(), self.count.into());
        map.insert(format!("hit@{}", self.k), round3(self.hit_at_k).into());
        map.insert("mrr".to_string(), round3(self.mrr).into());
        map.insert(format!("ndcg@{}", self.k), round3(self.ndcg_at_k).into());
        serde_json::Value::Object(map)
    }
}
