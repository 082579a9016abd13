//! FuseRAG LLM - Collaborator ports and adapters
//!
//! This crate defines the ports for the model collaborators the retrieval
//! engine depends on — embedding, pairwise relevance scoring, and query
//! classification — along with adapter implementations: Ollama HTTP
//! adapters for embedding and classification, and an optional fastembed
//! cross-encoder scorer behind the `reranker` feature.

pub mod ollama;
pub mod ports;

#[cfg(feature = "reranker")]
pub mod rerank;

pub use ollama::{OllamaClassifier, OllamaEmbedder};
pub use ports::{Embedder, IntentClassifier, RelevanceScorer};

#[cfg(feature = "reranker")]
pub use rerank::BgeScorer;
