//! Filesystem-backed parent store: one JSON record per parent unit key.
//!
//! Records are written to a temporary file and renamed into place, so a
//! crashed write never leaves a torn record behind.

use async_trait::async_trait;
use fuserag_core::error::{FuseragError, Result};
use fuserag_core::models::{ParentId, ParentUnit};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::ports::ParentStore;

/// Durable `ParentStore` over a workspace's `parents/` directory
#[derive(Debug, Clone)]
pub struct FsParentStore {
    dir: PathBuf,
}

impl FsParentStore {
    /// Open a store over `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: ParentId) -> PathBuf {
        self.dir.join(format!("{:016x}.json", id.0))
    }

    fn read_record(path: &Path) -> Result<ParentUnit> {
        let body = fs::read(path)?;
        serde_json::from_slice(&body).map_err(|e| {
            FuseragError::Serialization(format!(
                "corrupt parent record at {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl ParentStore for FsParentStore {
    async fn put(&self, unit: &ParentUnit) -> Result<()> {
        let body = serde_json::to_vec(unit)
            .map_err(|e| FuseragError::Serialization(e.to_string()))?;

        let path = self.record_path(unit.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(id = unit.id.0, path = %path.display(), "Stored parent unit");
        Ok(())
    }

    async fn get(&self, id: ParentId) -> Result<Option<ParentUnit>> {
        let path = self.record_path(id);
        match fs::metadata(&path) {
            Ok(_) => Ok(Some(Self::read_record(&path)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: ParentId) -> Result<()> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn enumerate(&self) -> Result<Vec<ParentUnit>> {
        let mut units = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                units.push(Self::read_record(&path)?);
            }
        }

        Ok(units)
    }
}
