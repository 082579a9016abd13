//! Second-pass relevance reranking over the fused shortlist.
//!
//! Scores every (query, candidate) pair with the cross-encoder port and
//! reorders the shortlist. Running without a scorer is a supported
//! configuration, not a failure: candidates pass through in fused order,
//! truncated to the final top-K.

use fuserag_core::config::RerankConfig;
use fuserag_llm::ports::RelevanceScorer;
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{DegradedStage, RetrievalCandidate};

/// Reranker component wrapping an optional scorer
pub struct Reranker {
    config: RerankConfig,
    scorer: Option<Arc<dyn RelevanceScorer>>,
}

impl Reranker {
    /// Create a reranker. Passing no scorer selects passthrough mode.
    pub fn new(config: RerankConfig, scorer: Option<Arc<dyn RelevanceScorer>>) -> Self {
        Self { config, scorer }
    }

    /// Reorder fused candidates into the final evidence set.
    ///
    /// Returns the evidence plus a degradation marker when the scorer was
    /// configured but failed at query time.
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievalCandidate>,
    ) -> (Vec<RetrievalCandidate>, Option<DegradedStage>) {
        // Distinct parents can share identical text (e.g. the same boilerplate
        // on every page); keep the earliest, which carries the best fused rank.
        let mut seen = HashSet::new();
        let mut deduped: Vec<RetrievalCandidate> =
            candidates.into_iter().filter(|c| seen.insert(c.text.clone())).collect();

        let scorer = match (&self.scorer, self.config.enabled) {
            (Some(scorer), true) => scorer,
            _ => {
                deduped.truncate(self.config.top_k);
                return (deduped, None);
            }
        };

        let passages: Vec<&str> = deduped.iter().map(|c| c.text.as_str()).collect();
        let scores = match scorer.score(query, &passages).await {
            Ok(scores) if scores.len() == deduped.len() => scores,
            Ok(scores) => {
                tracing::warn!(
                    expected = deduped.len(),
                    got = scores.len(),
                    "Scorer returned a mismatched score count; passing candidates through"
                );
                deduped.truncate(self.config.top_k);
                return (deduped, Some(DegradedStage::Rerank));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Relevance scoring failed; passing candidates through");
                deduped.truncate(self.config.top_k);
                return (deduped, Some(DegradedStage::Rerank));
            }
        };

        for (candidate, score) in deduped.iter_mut().zip(scores.iter()) {
            candidate.score = *score;
        }

        // Stable sort: candidates with equal scores keep their fused order,
        // so identical inputs always produce identical output.
        deduped.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        deduped.truncate(self.config.top_k);

        (deduped, None)
    }
}
