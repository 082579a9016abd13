//! Error types for FuseRAG

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FuseragError {
    // Workspace errors
    #[error("Workspace not found at {path}")]
    WorkspaceNotFound { path: PathBuf },

    #[error("Workspace already exists at {path}")]
    WorkspaceExists { path: PathBuf },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // Ingestion errors
    #[error("Failed to ingest document '{source_name}': {reason}")]
    IngestionFailed { source_name: String, reason: String },

    // Index errors
    #[error("No index built for this workspace yet")]
    IndexNotBuilt,

    #[error("Index snapshot does not match configuration: {reason}")]
    IndexMismatch { reason: String },

    // Collaborator errors
    #[error("Embedder unavailable: {reason}. Try: {remediation}")]
    EmbedderUnavailable {
        reason: String,
        remediation: String,
    },

    #[error("Query classification failed: {reason}")]
    ClassificationFailed { reason: String },

    #[error("Reranker unavailable: {reason}")]
    RerankerUnavailable { reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, FuseragError>;
