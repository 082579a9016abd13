//! Dense child-level vector index.
//!
//! Wraps the embedding port and a flat nearest-neighbor structure over
//! child unit vectors, each tagged with the id of its owning parent.
//! Snapshots are serialized to the workspace's dense directory; writes go
//! to a temporary file and are renamed into place, so the previous
//! snapshot survives a failed write.

use fuserag_core::error::{FuseragError, Result};
use fuserag_core::models::{ChildUnit, ParentId};
use fuserag_llm::ports::Embedder;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

const SNAPSHOT_FILE: &str = "index.json";

/// Distance metric for nearest-neighbor search; fixed at index creation
/// and recorded in the snapshot. Changing it requires a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Cosine distance: `1 - cosine_similarity`, lower is closer
    Cosine,
}

/// One indexed child vector with parent-resolution metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChildEntry {
    parent_id: ParentId,
    text: String,
    vector: Vec<f32>,
}

/// A nearest-neighbor match for a query vector
#[derive(Debug, Clone)]
pub struct ChildMatch {
    /// Owning parent of the matched child
    pub parent_id: ParentId,

    /// Child unit text
    pub text: String,

    /// Distance from the query vector, per the index metric
    pub distance: f32,
}

/// Snapshot persisted to disk
#[derive(Debug, Serialize, Deserialize)]
struct DenseSnapshot {
    embedder: String,
    dimension: usize,
    metric: DistanceMetric,
    entries: Vec<ChildEntry>,
}

/// Flat nearest-neighbor index over child unit embeddings
#[derive(Debug, Clone)]
pub struct DenseIndex {
    dir: PathBuf,
    embedder_model: String,
    dimension: usize,
    metric: DistanceMetric,
    entries: Vec<ChildEntry>,
}

impl DenseIndex {
    /// Create a new, empty index persisting under `dir`.
    pub fn create(
        dir: impl Into<PathBuf>,
        embedder_model: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            dir: dir.into(),
            embedder_model: embedder_model.into(),
            dimension,
            metric: DistanceMetric::Cosine,
            entries: Vec::new(),
        }
    }

    /// Load the snapshot under `dir`, if one exists.
    ///
    /// Fails with `IndexMismatch` when the snapshot was built with a
    /// different embedder or dimension than the configured one.
    pub fn load(
        dir: impl Into<PathBuf>,
        embedder_model: &str,
        dimension: usize,
    ) -> Result<Option<Self>> {
        let dir = dir.into();
        let path = dir.join(SNAPSHOT_FILE);

        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let snapshot: DenseSnapshot = serde_json::from_slice(&body)
            .map_err(|e| FuseragError::Serialization(format!("corrupt dense snapshot: {}", e)))?;

        if snapshot.embedder != embedder_model {
            return Err(FuseragError::IndexMismatch {
                reason: format!(
                    "snapshot was built with embedder '{}', configured embedder is '{}'",
                    snapshot.embedder, embedder_model
                ),
            });
        }

        if snapshot.dimension != dimension {
            return Err(FuseragError::IndexMismatch {
                reason: format!(
                    "snapshot dimension is {}, configured dimension is {}",
                    snapshot.dimension, dimension
                ),
            });
        }

        tracing::info!(
            path = %path.display(),
            entries = snapshot.entries.len(),
            "Loaded dense index snapshot"
        );

        Ok(Some(Self {
            dir,
            embedder_model: snapshot.embedder,
            dimension: snapshot.dimension,
            metric: snapshot.metric,
            entries: snapshot.entries,
        }))
    }

    /// Embed and index child units.
    ///
    /// Embedding happens before anything is appended, so a failed call
    /// leaves the index unchanged. Returns the number of children added.
    pub async fn add_children(
        &mut self,
        children: &[ChildUnit],
        embedder: &dyn Embedder,
    ) -> Result<usize> {
        if children.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = children.iter().map(|c| c.text.as_str()).collect();
        let vectors = embedder.embed(&texts).await?;

        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(FuseragError::IndexMismatch {
                    reason: format!(
                        "embedder returned a {}-dimensional vector, index expects {}",
                        vector.len(),
                        self.dimension
                    ),
                });
            }
        }

        for (child, vector) in children.iter().zip(vectors) {
            self.entries.push(ChildEntry {
                parent_id: child.parent_id,
                text: child.text.clone(),
                vector,
            });
        }

        Ok(children.len())
    }

    /// Write the current snapshot to disk.
    pub fn persist(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let snapshot = DenseSnapshot {
            embedder: self.embedder_model.clone(),
            dimension: self.dimension,
            metric: self.metric,
            entries: self.entries.clone(),
        };

        let body = serde_json::to_vec(&snapshot)
            .map_err(|e| FuseragError::Serialization(e.to_string()))?;

        let path = self.dir.join(SNAPSHOT_FILE);
        let tmp = self.dir.join(format!("{}.tmp", SNAPSHOT_FILE));
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(path = %path.display(), entries = self.entries.len(), "Persisted dense index");
        Ok(())
    }

    /// Nearest-neighbor search, ordered ascending by distance.
    ///
    /// An empty index yields empty results, not an error.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<ChildMatch> {
        let mut matches: Vec<ChildMatch> = self
            .entries
            .iter()
            .map(|entry| ChildMatch {
                parent_id: entry.parent_id,
                text: entry.text.clone(),
                distance: match self.metric {
                    DistanceMetric::Cosine => 1.0 - cosine_similarity(query, &entry.vector),
                },
            })
            .collect();

        matches.sort_by(|a, b| {
            a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(k);
        matches
    }

    /// Ids of every parent with at least one indexed child
    pub fn parent_ids(&self) -> HashSet<ParentId> {
        self.entries.iter().map(|e| e.parent_id).collect()
    }

    /// Number of indexed children
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no children
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedder identity the index was created with
    pub fn embedder_model(&self) -> &str {
        &self.embedder_model
    }
}

/// Cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
