use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FuseragError, Result};

const MANIFEST_FILE: &str = "workspace.json";

/// Handle to an isolated retrieval scope on disk.
///
/// A workspace owns one parent store directory and one dense index
/// directory; the sparse index is derived in memory from the parent store.
/// Handles are created or opened explicitly by the caller and passed down —
/// there is no process-wide registry keyed by path.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

/// Manifest persisted at the workspace root
#[derive(Debug, Serialize, Deserialize)]
struct WorkspaceManifest {
    created_at: DateTime<Utc>,
}

impl Workspace {
    /// Create a new workspace at `root`.
    ///
    /// Fails with `WorkspaceExists` if a workspace manifest is already
    /// present there.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.join(MANIFEST_FILE).exists() {
            return Err(FuseragError::WorkspaceExists { path: root });
        }

        fs::create_dir_all(&root)?;
        let ws = Self { root };
        fs::create_dir_all(ws.parents_dir())?;
        fs::create_dir_all(ws.dense_dir())?;

        let manifest = WorkspaceManifest { created_at: Utc::now() };
        let body = serde_json::to_vec_pretty(&manifest)
            .map_err(|e| FuseragError::Serialization(e.to_string()))?;
        fs::write(ws.root.join(MANIFEST_FILE), body)?;

        tracing::info!(path = %ws.root.display(), "Created workspace");
        Ok(ws)
    }

    /// Open an existing workspace at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(MANIFEST_FILE).exists() {
            return Err(FuseragError::WorkspaceNotFound { path: root });
        }
        Ok(Self { root })
    }

    /// Open the workspace at `root`, creating it if absent.
    pub fn create_or_open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if root.join(MANIFEST_FILE).exists() {
            Self::open(root)
        } else {
            Self::create(root)
        }
    }

    /// Workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one durable record per parent unit
    pub fn parents_dir(&self) -> PathBuf {
        self.root.join("parents")
    }

    /// Directory holding the serialized dense index snapshot
    pub fn dense_dir(&self) -> PathBuf {
        self.root.join("dense")
    }

    /// Tear down the workspace, removing all derived state.
    pub fn destroy(self) -> Result<()> {
        tracing::info!(path = %self.root.display(), "Destroying workspace");
        fs::remove_dir_all(&self.root)?;
        Ok(())
    }
}

/// Index build state, recorded after each successful mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexState {
    /// When the indices were last brought in sync
    pub built_at: DateTime<Utc>,

    /// Embedder used for the dense index
    pub embedder: String,

    /// Number of parent units in both indices
    pub parent_count: usize,

    /// Number of child units in the dense index
    pub child_count: usize,

    /// Embedding dimension
    pub embedding_dim: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_and_open() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("ws");

        let ws = Workspace::create(&root).unwrap();
        assert!(ws.parents_dir().is_dir());
        assert!(ws.dense_dir().is_dir());

        let reopened = Workspace::open(&root).unwrap();
        assert_eq!(reopened.root(), root.as_path());
    }

    #[test]
    fn test_create_twice_fails() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("ws");

        Workspace::create(&root).unwrap();
        let err = Workspace::create(&root).unwrap_err();
        assert!(matches!(err, FuseragError::WorkspaceExists { .. }));
    }

    #[test]
    fn test_open_missing_fails() {
        let dir = tempdir().unwrap();
        let err = Workspace::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, FuseragError::WorkspaceNotFound { .. }));
    }

    #[test]
    fn test_destroy_removes_everything() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("ws");

        let ws = Workspace::create(&root).unwrap();
        std::fs::write(ws.parents_dir().join("x.json"), b"{}").unwrap();

        ws.destroy().unwrap();
        assert!(!root.exists());
    }
}
