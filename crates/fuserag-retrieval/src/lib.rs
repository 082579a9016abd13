//! FuseRAG Retrieval - Hybrid retrieval and reranking
//!
//! The retrieval half of the engine: a dense child-level vector index, a
//! BM25 parent-level lexical index, weighted rank fusion of both, an
//! optional cross-encoder rerank pass, a query-intent router, and the
//! per-workspace `RetrievalEngine` that coordinates ingestion, deletion,
//! and queries with swap-on-success rebuilds.

pub mod dense;
pub mod engine;
pub mod fusion;
pub mod models;
pub mod rerank;
pub mod router;
pub mod sparse;

pub use dense::{ChildMatch, DenseIndex, DistanceMetric};
pub use engine::RetrievalEngine;
pub use fusion::{fuse, EvidenceSource, SourceHits};
pub use models::{DegradedStage, IngestReport, RetrievalCandidate, RetrievalOutcome};
pub use rerank::Reranker;
pub use router::QueryRouter;
pub use sparse::SparseIndex;
