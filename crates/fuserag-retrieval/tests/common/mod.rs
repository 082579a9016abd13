//! Shared test doubles for the retrieval integration tests.

use async_trait::async_trait;
use fuserag_core::config::{ChunkingConfig, RetrievalConfig};
use fuserag_core::error::{FuseragError, Result};
use fuserag_llm::ports::{Embedder, IntentClassifier, RelevanceScorer};

pub const TEST_DIM: usize = 32;

/// Deterministic embedder: a fixed-dimension bag of character counts.
/// Similar texts land near each other, which is all the tests need.
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; TEST_DIM];
                for byte in text.bytes() {
                    v[byte as usize % TEST_DIM] += 1.0;
                }
                v
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }

    fn model_name(&self) -> &str {
        "hash-test"
    }
}

/// Fails for any batch containing the marker word; otherwise delegates to
/// `HashEmbedder`. Used to exercise per-document ingestion isolation.
pub struct PoisonEmbedder {
    pub marker: &'static str,
}

#[async_trait]
impl Embedder for PoisonEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains(self.marker)) {
            return Err(FuseragError::EmbedderUnavailable {
                reason: "marker text rejected".to_string(),
                remediation: "use a batch without the marker".to_string(),
            });
        }
        HashEmbedder.embed(texts).await
    }

    fn dimensions(&self) -> usize {
        TEST_DIM
    }

    fn model_name(&self) -> &str {
        "hash-test"
    }
}

/// Returns a fixed label for every query
pub struct StaticClassifier {
    pub label: &'static str,
}

#[async_trait]
impl IntentClassifier for StaticClassifier {
    async fn classify(&self, _query: &str, _labels: &[&str]) -> Result<String> {
        Ok(self.label.to_string())
    }
}

/// Scores a passage by how many query words it contains
pub struct WordOverlapScorer;

#[async_trait]
impl RelevanceScorer for WordOverlapScorer {
    async fn score(&self, query: &str, passages: &[&str]) -> Result<Vec<f32>> {
        Ok(passages
            .iter()
            .map(|p| query.split_whitespace().filter(|w| p.contains(w)).count() as f32)
            .collect())
    }

    fn model_name(&self) -> &str {
        "word-overlap-test"
    }
}

/// Always fails, for rerank degradation tests
pub struct FailingScorer;

#[async_trait]
impl RelevanceScorer for FailingScorer {
    async fn score(&self, _query: &str, _passages: &[&str]) -> Result<Vec<f32>> {
        Err(FuseragError::RerankerUnavailable { reason: "model not loaded".to_string() })
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// Engine configuration sized for small test documents
pub fn test_config() -> RetrievalConfig {
    let mut config = RetrievalConfig::with_defaults();
    config
        .embedder
        .update("hash-test".to_string(), fuserag_core::config::ConfigSource::Caller);
    config
        .embedder_dimensions
        .update(TEST_DIM, fuserag_core::config::ConfigSource::Caller);
    config.chunking = ChunkingConfig {
        parent_size: 200,
        parent_overlap: 20,
        child_size: 60,
        child_overlap: 10,
    };
    config
}
