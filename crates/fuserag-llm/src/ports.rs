//! Collaborator port definitions

use async_trait::async_trait;
use fuserag_core::error::Result;

/// Port for embedding text into vector representations
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embeddings for a batch of texts
    ///
    /// # Arguments
    /// * `texts` - Slice of text strings to embed
    ///
    /// # Returns
    /// Vector of embedding vectors, one per input text
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Get the dimensionality of embeddings produced by this embedder
    fn dimensions(&self) -> usize;

    /// Get the name/identifier of the embedding model
    fn model_name(&self) -> &str;
}

/// Port for pairwise query/passage relevance scoring
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    /// Score every (query, passage) pair.
    ///
    /// Returns one score per passage, in input order; higher means more
    /// relevant.
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>>;

    /// Get the name/identifier of the scoring model
    fn model_name(&self) -> &str;
}

/// Port for classifying a query into a closed label set
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classify `query` into one of `labels`, returning the raw label
    /// text emitted by the model.
    ///
    /// Callers must treat anything outside `labels` as a failed
    /// classification.
    async fn classify(&self, query: &str, labels: &[&str]) -> Result<String>;
}
