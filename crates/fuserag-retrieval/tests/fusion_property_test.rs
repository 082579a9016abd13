//! Property tests for weighted rank fusion.

use fuserag_core::config::FusionConfig;
use fuserag_core::models::{ParentId, ParentUnit, SourceMetadata};
use fuserag_retrieval::fuse;
use proptest::prelude::*;

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

proptest! {
    #[test]
    fn fused_output_is_sorted_and_bounded(
        dense_ids in proptest::collection::vec(0u64..50, 0..40),
        sparse_ids in proptest::collection::vec(0u64..50, 0..40),
    ) {
        let dense: Vec<ParentUnit> = dense_ids.iter().copied().map(parent).collect();
        let sparse: Vec<ParentUnit> = sparse_ids.iter().copied().map(parent).collect();
        let config = FusionConfig::default();

        let fused = fuse(&dense, &sparse, &config);

        prop_assert!(fused.len() <= config.ceiling);

        for pair in fused.windows(2) {
            prop_assert!(pair[0].1 >= pair[1].1);
        }

        // Dedup: each parent id appears at most once.
        let mut ids: Vec<u64> = fused.iter().map(|(u, _)| u.id.0).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), fused.len());
    }

    #[test]
    fn co_occurring_parent_never_scores_below_its_single_source_runs(
        shared in 0u64..10,
        dense_only in 10u64..20,
    ) {
        let dense = vec![parent(shared), parent(dense_only)];
        let sparse = vec![parent(shared)];
        let config = FusionConfig::default();

        let both = fuse(&dense, &sparse, &config);
        let dense_alone = fuse(&dense, &[], &config);

        let score_both = both.iter().find(|(u, _)| u.id.0 == shared).unwrap().1;
        let score_alone = dense_alone.iter().find(|(u, _)| u.id.0 == shared).unwrap().1;
        prop_assert!(score_both > score_alone);
    }
}
