//! Cross-encoder relevance scorer using fastembed's BGE reranker.
//!
//! Scores query-document pairs together for more accurate relevance
//! ranking than bi-encoder similarity. Optional: this module only exists
//! with the `reranker` feature; without it the engine runs in passthrough
//! mode.

use async_trait::async_trait;
use fastembed::{RerankInitOptions, RerankerModel, TextRerank};
use fuserag_core::error::{FuseragError, Result};
use std::sync::Mutex;

use crate::ports::RelevanceScorer;

/// BGE cross-encoder scorer (BAAI/bge-reranker-base).
///
/// Downloads the model on first use (~300MB). The fastembed session is not
/// `Sync`-friendly for concurrent scoring, so calls are serialized behind a
/// mutex; the rerank shortlist is small enough that this is not a
/// bottleneck.
pub struct BgeScorer {
    model: Mutex<TextRerank>,
    model_name: String,
}

impl BgeScorer {
    /// Create a new BGE scorer.
    pub fn new() -> Result<Self> {
        let opts = RerankInitOptions::new(RerankerModel::BGERerankerBase)
            .with_show_download_progress(false);

        let model = TextRerank::try_new(opts)
            .map_err(|e| FuseragError::RerankerUnavailable { reason: e.to_string() })?;

        Ok(Self {
            model: Mutex::new(model),
            model_name: "bge-reranker-base".to_string(),
        })
    }
}

#[async_trait]
impl RelevanceScorer for BgeScorer {
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let mut model = self
            .model
            .lock()
            .map_err(|_| FuseragError::RerankerUnavailable {
                reason: "scorer poisoned by a previous panic".to_string(),
            })?;

        let results = model
            .rerank(query, passages, false, None)
            .map_err(|e| FuseragError::RerankerUnavailable { reason: e.to_string() })?;

        // fastembed returns results sorted by score; map back to input order
        let mut scores = vec![0.0f32; passages.len()];
        for result in results {
            scores[result.index] = result.score;
        }

        Ok(scores)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires model download, run with: cargo test --features reranker -- --ignored
    async fn test_relevant_scores_higher_than_irrelevant() {
        let scorer = BgeScorer::new().unwrap();

        let query = "What is the warm-up period before calibration?";
        let passages = [
            "The bench requires a thirty minute warm-up period before calibration.",
            "The cafeteria serves lunch between noon and two.",
        ];

        let scores = scorer.score(query, &passages).await.unwrap();
        assert!(
            scores[0] > scores[1],
            "relevant passage should score higher: {:.4} vs {:.4}",
            scores[0],
            scores[1]
        );
    }
}
