//! Weighted rank fusion of dense and sparse results.
//!
//! Each source contributes a reciprocal-rank score scaled by its weight;
//! a parent found by both sources receives the sum of both contributions,
//! so co-occurrence reliably outranks single-source hits of similar rank.
//! No renormalization happens when a source is missing — the other source
//! simply contributes alone.

use fuserag_core::config::FusionConfig;
use fuserag_core::models::{ParentId, ParentUnit};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::dense::{ChildMatch, DenseIndex};
use crate::sparse::SparseIndex;

/// Reciprocal-rank smoothing constant. Dampens the gap between the first
/// few ranks so one source cannot drown out the other.
const RRF_K: f32 = 60.0;

/// The indices available to answer one query.
///
/// Tagged up front from whatever the workspace currently holds, so
/// downstream code never inspects index presence at call sites.
#[derive(Clone)]
pub enum EvidenceSource {
    /// Only the dense index exists
    DenseOnly(Arc<DenseIndex>),

    /// Only the sparse index exists
    SparseOnly(Arc<SparseIndex>),

    /// Both indices exist; results are fused
    Fused {
        dense: Arc<DenseIndex>,
        sparse: Arc<SparseIndex>,
    },
}

/// Raw per-source hits for one query
#[derive(Debug, Clone, Default)]
pub struct SourceHits {
    /// Dense child matches, ascending by distance
    pub dense: Vec<ChildMatch>,

    /// Sparse parent hits, descending by score
    pub sparse: Vec<(ParentUnit, f32)>,
}

impl EvidenceSource {
    /// Tag a source from whichever indices the workspace holds.
    /// Returns `None` when neither exists.
    pub fn from_parts(
        dense: Option<Arc<DenseIndex>>,
        sparse: Option<Arc<SparseIndex>>,
    ) -> Option<Self> {
        match (dense, sparse) {
            (Some(dense), Some(sparse)) => Some(EvidenceSource::Fused { dense, sparse }),
            (Some(dense), None) => Some(EvidenceSource::DenseOnly(dense)),
            (None, Some(sparse)) => Some(EvidenceSource::SparseOnly(sparse)),
            (None, None) => None,
        }
    }

    /// Whether this source runs a dense search and therefore needs the
    /// query embedded
    pub fn needs_query_vector(&self) -> bool {
        !matches!(self, EvidenceSource::SparseOnly(_))
    }

    /// Run every search this source supports.
    ///
    /// `query_vector` is `None` when query embedding failed; the dense
    /// side then contributes nothing and fusion degrades to sparse alone.
    pub fn search(
        &self,
        query_vector: Option<&[f32]>,
        query_text: &str,
        config: &FusionConfig,
    ) -> SourceHits {
        let mut hits = SourceHits::default();

        match self {
            EvidenceSource::DenseOnly(dense) => {
                if let Some(vector) = query_vector {
                    hits.dense = dense.search(vector, config.dense_k);
                }
            }
            EvidenceSource::SparseOnly(sparse) => {
                hits.sparse = sparse.search(query_text, config.sparse_k);
            }
            EvidenceSource::Fused { dense, sparse } => {
                if let Some(vector) = query_vector {
                    hits.dense = dense.search(vector, config.dense_k);
                }
                hits.sparse = sparse.search(query_text, config.sparse_k);
            }
        }

        hits
    }
}

/// Fuse per-source ranked parent lists into one descending list.
///
/// `dense_parents` must already be resolved from child hits to parents,
/// best rank first with one entry per parent. Output is deduplicated by
/// parent id, sorted by fused score (ties by id for determinism), and
/// truncated to the configured ceiling.
pub fn fuse(
    dense_parents: &[ParentUnit],
    sparse_parents: &[ParentUnit],
    config: &FusionConfig,
) -> Vec<(ParentUnit, f32)> {
    let mut scores: HashMap<ParentId, f32> = HashMap::new();
    let mut units: HashMap<ParentId, &ParentUnit> = HashMap::new();

    let mut seen = HashSet::new();
    for (rank, unit) in dense_parents.iter().enumerate() {
        // First occurrence carries the best rank for this source.
        if seen.insert(unit.id) {
            *scores.entry(unit.id).or_default() +=
                config.dense_weight / (RRF_K + rank as f32 + 1.0);
            units.entry(unit.id).or_insert(unit);
        }
    }

    let mut seen = HashSet::new();
    for (rank, unit) in sparse_parents.iter().enumerate() {
        if seen.insert(unit.id) {
            *scores.entry(unit.id).or_default() +=
                config.sparse_weight / (RRF_K + rank as f32 + 1.0);
            units.entry(unit.id).or_insert(unit);
        }
    }

    let mut fused: Vec<(ParentUnit, f32)> = scores
        .into_iter()
        .map(|(id, score)| ((*units[&id]).clone(), score))
        .collect();

    fused.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    });
    fused.truncate(config.ceiling);
    fused
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuserag_core::models::SourceMetadata;

    fn parent(id: u64) -> ParentUnit {
        ParentUnit {
            id: ParentId(id),
            text: format!("parent {}", id),
            metadata: SourceMetadata {
                source: "doc.txt".to_string(),
                page: None,
                offset: 0,
                parser_tag: None,
            },
        }
    }

    #[test]
    fn test_co_occurrence_outranks_single_source_rank_one() {
        let config = FusionConfig::default();

        // Rank 1 in both lists vs. rank 1 in a single list.
        let both = fuse(&[parent(1)], &[parent(1)], &config);
        let dense_only = fuse(&[parent(2)], &[], &config);
        let sparse_only = fuse(&[], &[parent(3)], &config);

        assert!(both[0].1 > dense_only[0].1);
        assert!(both[0].1 > sparse_only[0].1);
    }

    #[test]
    fn test_single_source_weights_respected() {
        // Same rank in opposite sources: the dense hit should win under
        // the default 0.6/0.4 weights.
        let dense = vec![parent(1)];
        let sparse = vec![parent(2)];
        let config = FusionConfig::default();

        let fused = fuse(&dense, &sparse, &config);
        assert_eq!(fused[0].0.id, ParentId(1));
        assert_eq!(fused[1].0.id, ParentId(2));
    }

    #[test]
    fn test_duplicate_within_source_keeps_best_rank() {
        // Parent 1 appears twice in the dense list; only the rank-1
        // contribution counts.
        let dense = vec![parent(1), parent(1), parent(2)];
        let config = FusionConfig::default();

        let fused = fuse(&dense, &[], &config);
        let expected = config.dense_weight / (RRF_K + 1.0);
        let got = fused.iter().find(|(u, _)| u.id == ParentId(1)).unwrap().1;
        assert!((got - expected).abs() < 1e-6);
    }

    #[test]
    fn test_missing_source_degrades_without_renormalization() {
        let sparse = vec![parent(1), parent(2)];
        let config = FusionConfig::default();

        let fused = fuse(&[], &sparse, &config);
        assert_eq!(fused.len(), 2);

        // Scores are plain sparse contributions, not scaled up.
        let expected = config.sparse_weight / (RRF_K + 1.0);
        assert!((fused[0].1 - expected).abs() < 1e-6);
    }

    #[test]
    fn test_truncates_to_ceiling() {
        let dense: Vec<ParentUnit> = (0..40).map(parent).collect();
        let config = FusionConfig { ceiling: 15, ..FusionConfig::default() };

        let fused = fuse(&dense, &[], &config);
        assert_eq!(fused.len(), 15);
    }

    #[test]
    fn test_empty_sources_fuse_to_empty() {
        let fused = fuse(&[], &[], &FusionConfig::default());
        assert!(fused.is_empty());
    }

    #[test]
    fn test_from_parts_tags_availability() {
        assert!(EvidenceSource::from_parts(None, None).is_none());

        let sparse = Arc::new(SparseIndex::build(&[]));
        match EvidenceSource::from_parts(None, Some(sparse)) {
            Some(EvidenceSource::SparseOnly(_)) => {}
            _ => panic!("expected SparseOnly"),
        }
    }
}
