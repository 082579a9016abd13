use fuserag_core::models::{Intent, ParentUnit};
use serde::{Deserialize, Serialize};

/// One piece of evidence returned to the caller.
///
/// Carries enough provenance (source filename, page, offset) for the
/// downstream generation collaborator to build citations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    /// Parent unit text
    pub text: String,

    /// Source document filename
    pub source: String,

    /// Page number, when the source was paginated
    pub page: Option<usize>,

    /// Character offset of the unit within the source text
    pub offset: usize,

    /// Identifier of the parser that extracted the text
    pub parser_tag: Option<String>,

    /// Fused score before reranking, rerank score after
    pub score: f32,
}

impl RetrievalCandidate {
    /// Build a candidate from a parent unit and its score
    pub fn from_parent(unit: &ParentUnit, score: f32) -> Self {
        Self {
            text: unit.text.clone(),
            source: unit.metadata.source.clone(),
            page: unit.metadata.page,
            offset: unit.metadata.offset,
            parser_tag: unit.metadata.parser_tag.clone(),
            score,
        }
    }
}

/// A retrieval stage that failed and was degraded rather than surfaced
/// as an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradedStage {
    /// Query classification failed; the conservative fallback intent was used
    Router,

    /// Query embedding failed; dense results were skipped
    DenseSearch,

    /// Relevance scoring failed; candidates passed through in fused order
    Rerank,
}

/// Result of one `retrieve` call.
///
/// An empty `evidence` with an empty `degraded` list means the corpus had
/// nothing relevant; a non-empty `degraded` list means part of the
/// retrieval subsystem failed and the evidence may be partial. Callers
/// message the two cases differently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalOutcome {
    /// Final evidence set, best first
    pub evidence: Vec<RetrievalCandidate>,

    /// The intent the query was routed to
    pub route: Intent,

    /// Stages that degraded while answering this query
    pub degraded: Vec<DegradedStage>,
}

impl RetrievalOutcome {
    /// Create an outcome with no evidence and no degradation
    pub fn empty(route: Intent) -> Self {
        Self { evidence: Vec::new(), route, degraded: Vec::new() }
    }

    /// Whether every stage ran cleanly
    pub fn is_reliable(&self) -> bool {
        self.degraded.is_empty()
    }
}

/// Aggregate report for one ingestion batch.
///
/// Per-document failures are isolated and counted here; they never abort
/// the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents chunked, embedded, and stored
    pub documents_indexed: usize,

    /// Documents skipped after a chunking/embedding failure
    pub documents_failed: usize,

    /// Parent units written to the store
    pub parents_indexed: usize,

    /// Child units added to the dense index
    pub children_indexed: usize,
}
