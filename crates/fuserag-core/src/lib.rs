//! FuseRAG Core - Domain models, workspace, and configuration
//!
//! This crate contains the core domain logic for the FuseRAG retrieval
//! engine: parent/child units, query intents, the workspace handle, the
//! error taxonomy, layered configuration, and text chunking.

pub mod config;
pub mod error;
pub mod models;
pub mod processing;

pub use error::{FuseragError, Result};
