//! Per-workspace ingestion/rebuild coordinator and retrieval entry point.
//!
//! The engine owns the active index references for one workspace and
//! cycles them `Empty -> Indexed -> Indexed` across mutations. Mutations
//! are serialized by a per-engine mutex; concurrent queries read the
//! previously swapped-in snapshots, so a reader sees either the complete
//! old index or the complete new one, never a half-rebuilt state.

use chrono::Utc;
use fuserag_core::config::RetrievalConfig;
use fuserag_core::error::{FuseragError, Result};
use fuserag_core::models::{
    ChildUnit, DocumentInput, IndexState, Intent, ParentId, ParentUnit, Workspace,
};
use fuserag_core::processing::Chunker;
use fuserag_llm::ports::{Embedder, IntentClassifier, RelevanceScorer};
use fuserag_store::ports::ParentStore;
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::dense::DenseIndex;
use crate::fusion::{fuse, EvidenceSource};
use crate::models::{DegradedStage, IngestReport, RetrievalCandidate, RetrievalOutcome};
use crate::rerank::Reranker;
use crate::router::QueryRouter;
use crate::sparse::SparseIndex;

/// Active index references; replaced atomically after a successful mutation
struct ActiveIndices {
    dense: Option<Arc<DenseIndex>>,
    sparse: Option<Arc<SparseIndex>>,
}

/// Hybrid retrieval engine for one workspace
pub struct RetrievalEngine {
    workspace: Workspace,
    config: RetrievalConfig,
    chunker: Chunker,
    store: Arc<dyn ParentStore>,
    embedder: Arc<dyn Embedder>,
    router: QueryRouter,
    reranker: Reranker,
    indices: RwLock<ActiveIndices>,
    index_state: RwLock<Option<IndexState>>,
    // One in-flight mutation per workspace
    mutation: Mutex<()>,
}

impl RetrievalEngine {
    /// Open the engine over a workspace.
    ///
    /// Restores the dense index snapshot if one exists and rebuilds the
    /// sparse index from the parent store. Configuration is validated here:
    /// a missing embedder model identifier is fatal at startup.
    pub async fn open(
        workspace: Workspace,
        config: RetrievalConfig,
        store: Arc<dyn ParentStore>,
        embedder: Arc<dyn Embedder>,
        classifier: Option<Arc<dyn IntentClassifier>>,
        scorer: Option<Arc<dyn RelevanceScorer>>,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = Chunker::new(&config.chunking)?;

        let dense = DenseIndex::load(
            workspace.dense_dir(),
            embedder.model_name(),
            embedder.dimensions(),
        )?
        .map(Arc::new);

        let parents = store.enumerate().await?;
        let sparse =
            if parents.is_empty() { None } else { Some(Arc::new(SparseIndex::build(&parents))) };

        let index_state = if dense.is_some() || sparse.is_some() {
            Some(IndexState {
                built_at: Utc::now(),
                embedder: embedder.model_name().to_string(),
                parent_count: parents.len(),
                child_count: dense.as_ref().map(|d| d.len()).unwrap_or(0),
                embedding_dim: embedder.dimensions(),
            })
        } else {
            None
        };

        let router = QueryRouter::new(classifier, config.router.cache_capacity);
        let reranker = Reranker::new(config.rerank.clone(), scorer);

        Ok(Self {
            workspace,
            config,
            chunker,
            store,
            embedder,
            router,
            reranker,
            indices: RwLock::new(ActiveIndices { dense, sparse }),
            index_state: RwLock::new(index_state),
            mutation: Mutex::new(()),
        })
    }

    /// Ingest a batch of documents.
    ///
    /// Each document is chunked and its children embedded before anything
    /// is written, so a document that fails leaves no trace; failures are
    /// isolated, logged, and counted in the report, never aborting the
    /// batch. The dense index grows incrementally; the sparse index is
    /// unconditionally rebuilt from the store's full enumeration.
    pub async fn add_documents(&self, inputs: &[DocumentInput]) -> Result<IngestReport> {
        let _guard = self.mutation.lock().await;

        let mut report = IngestReport::default();

        // Work on a copy of the active dense index; readers keep the old
        // snapshot until the swap.
        let mut next_dense = {
            let indices = self.indices.read().unwrap();
            indices.dense.as_ref().map(|d| (**d).clone()).unwrap_or_else(|| {
                DenseIndex::create(
                    self.workspace.dense_dir(),
                    self.embedder.model_name(),
                    self.embedder.dimensions(),
                )
            })
        };

        for input in inputs {
            let units = self.chunker.chunk_document(input);
            if units.is_empty() {
                tracing::info!(source = %input.source, "Document yielded no text; nothing to index");
                report.documents_indexed += 1;
                continue;
            }

            let children: Vec<ChildUnit> =
                units.iter().flat_map(|(_, children)| children.iter().cloned()).collect();

            match next_dense.add_children(&children, &*self.embedder).await {
                Ok(added) => {
                    for (parent, _) in &units {
                        self.store.put(parent).await?;
                    }
                    report.documents_indexed += 1;
                    report.parents_indexed += units.len();
                    report.children_indexed += added;
                }
                Err(
                    e @ (FuseragError::EmbedderUnavailable { .. }
                    | FuseragError::IndexMismatch { .. }),
                ) => {
                    let failure = FuseragError::IngestionFailed {
                        source_name: input.source.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(error = %failure, "Skipping document");
                    report.documents_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        next_dense.persist()?;

        let parents = self.store.enumerate().await?;
        let (dense, sparse) = if parents.is_empty() {
            (None, None)
        } else {
            (Some(Arc::new(next_dense)), Some(Arc::new(SparseIndex::build(&parents))))
        };
        self.swap_indices(dense, sparse, parents.len());

        tracing::info!(
            indexed = report.documents_indexed,
            failed = report.documents_failed,
            parents = report.parents_indexed,
            children = report.children_indexed,
            "Ingestion batch complete"
        );

        Ok(report)
    }

    /// Delete every parent unit belonging to `source` and rebuild both
    /// indices from the remaining enumeration.
    ///
    /// Neither index supports selective delete; the fresh structures are
    /// built off to the side and swapped in only on complete success, so
    /// any failure leaves the prior indices — in memory and on disk —
    /// intact. Returns the number of parent units removed.
    pub async fn delete_document(&self, source: &str) -> Result<usize> {
        let _guard = self.mutation.lock().await;

        let parents = self.store.enumerate().await?;
        let doomed: Vec<ParentId> = parents
            .iter()
            .filter(|p| p.metadata.source == source)
            .map(|p| p.id)
            .collect();

        if doomed.is_empty() {
            tracing::info!(source, "No parent units matched; nothing to delete");
            return Ok(0);
        }

        for id in &doomed {
            self.store.delete(*id).await?;
        }

        let remaining = self.store.enumerate().await?;

        if remaining.is_empty() {
            let empty = DenseIndex::create(
                self.workspace.dense_dir(),
                self.embedder.model_name(),
                self.embedder.dimensions(),
            );
            empty.persist()?;
            self.swap_indices(None, None, 0);

            tracing::info!(source, removed = doomed.len(), "Deleted last document; workspace empty");
            return Ok(doomed.len());
        }

        let mut fresh_dense = DenseIndex::create(
            self.workspace.dense_dir(),
            self.embedder.model_name(),
            self.embedder.dimensions(),
        );
        for parent in &remaining {
            let children = self.chunker.child_units(parent);
            fresh_dense.add_children(&children, &*self.embedder).await?;
        }
        fresh_dense.persist()?;

        let fresh_sparse = SparseIndex::build(&remaining);
        let parent_count = remaining.len();
        self.swap_indices(Some(Arc::new(fresh_dense)), Some(Arc::new(fresh_sparse)), parent_count);

        tracing::info!(source, removed = doomed.len(), remaining = parent_count, "Deleted document and rebuilt indices");
        Ok(doomed.len())
    }

    /// Answer a query with ranked evidence.
    ///
    /// Routing decides whether retrieval runs at all; `route_override`
    /// skips classification. Retrieval-time failures never surface as
    /// errors — they degrade the outcome and are recorded in `degraded`,
    /// so callers can distinguish "nothing relevant" from "subsystem
    /// trouble".
    pub async fn retrieve(&self, query: &str, route_override: Option<Intent>) -> RetrievalOutcome {
        let mut degraded = Vec::new();

        let route = match route_override {
            Some(route) => route,
            None => {
                let (route, stage) = self.router.classify(query).await;
                degraded.extend(stage);
                route
            }
        };

        if !route.requires_retrieval() {
            return RetrievalOutcome { evidence: Vec::new(), route, degraded };
        }

        let Some(source) = self.evidence_source() else {
            // Nothing indexed yet: legitimately empty evidence, not an error.
            return RetrievalOutcome { evidence: Vec::new(), route, degraded };
        };

        let query_vector = if source.needs_query_vector() {
            match self.embedder.embed(&[query]).await {
                Ok(mut vectors) if !vectors.is_empty() => Some(vectors.remove(0)),
                Ok(_) => {
                    degraded.push(DegradedStage::DenseSearch);
                    None
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Query embedding failed; dense search skipped");
                    degraded.push(DegradedStage::DenseSearch);
                    None
                }
            }
        } else {
            None
        };

        let hits = source.search(query_vector.as_deref(), query, &self.config.fusion);

        // Resolve dense child hits to their parents through the store; a
        // child is never surfaced directly as evidence.
        let mut dense_parents: Vec<ParentUnit> = Vec::new();
        let mut seen = HashSet::new();
        for hit in &hits.dense {
            if !seen.insert(hit.parent_id) {
                continue;
            }
            match self.store.get(hit.parent_id).await {
                Ok(Some(parent)) => dense_parents.push(parent),
                Ok(None) => tracing::warn!(
                    parent_id = hit.parent_id.0,
                    "Dense hit resolved to a missing parent; skipping"
                ),
                Err(e) => tracing::warn!(error = %e, "Parent resolution failed; skipping hit"),
            }
        }

        let sparse_parents: Vec<ParentUnit> =
            hits.sparse.iter().map(|(unit, _)| unit.clone()).collect();

        let fused = fuse(&dense_parents, &sparse_parents, &self.config.fusion);
        let candidates: Vec<RetrievalCandidate> = fused
            .iter()
            .map(|(unit, score)| RetrievalCandidate::from_parent(unit, *score))
            .collect();

        let (evidence, stage) = self.reranker.rerank(query, candidates).await;
        degraded.extend(stage);

        RetrievalOutcome { evidence, route, degraded }
    }

    /// The tagged evidence source over the current index snapshots,
    /// `None` while the workspace is empty
    pub fn evidence_source(&self) -> Option<EvidenceSource> {
        let indices = self.indices.read().unwrap();
        EvidenceSource::from_parts(indices.dense.clone(), indices.sparse.clone())
    }

    /// State of the indices after the last successful mutation, `None`
    /// while the workspace is empty
    pub fn index_state(&self) -> Option<IndexState> {
        self.index_state.read().unwrap().clone()
    }

    /// The workspace this engine operates on
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Replace the active index references and recompute the index state.
    /// Called only with fully built structures, under the mutation lock.
    fn swap_indices(
        &self,
        dense: Option<Arc<DenseIndex>>,
        sparse: Option<Arc<SparseIndex>>,
        parent_count: usize,
    ) {
        let child_count = dense.as_ref().map(|d| d.len()).unwrap_or(0);

        {
            let mut indices = self.indices.write().unwrap();
            indices.dense = dense;
            indices.sparse = sparse;
        }

        let state = if parent_count == 0 {
            None
        } else {
            Some(IndexState {
                built_at: Utc::now(),
                embedder: self.embedder.model_name().to_string(),
                parent_count,
                child_count,
                embedding_dim: self.embedder.dimensions(),
            })
        };
        *self.index_state.write().unwrap() = state;
    }
}
