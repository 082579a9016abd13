//! In-memory storage implementation for development and testing.
//!
//! Uses `RwLock::unwrap()` intentionally. Lock poisoning only occurs when
//! another thread panicked while holding the lock, which is an
//! unrecoverable state. For durable workloads, use `FsParentStore`.

use async_trait::async_trait;
use fuserag_core::error::Result;
use fuserag_core::models::{ParentId, ParentUnit};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::ports::ParentStore;

/// In-memory implementation of `ParentStore`
#[derive(Debug, Clone, Default)]
pub struct MemoryParentStore {
    units: Arc<RwLock<HashMap<ParentId, ParentUnit>>>,
}

impl MemoryParentStore {
    /// Create a new in-memory parent store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored units
    pub fn len(&self) -> usize {
        self.units.read().unwrap().len()
    }

    /// Whether the store holds no units
    pub fn is_empty(&self) -> bool {
        self.units.read().unwrap().is_empty()
    }
}

#[async_trait]
impl ParentStore for MemoryParentStore {
    async fn put(&self, unit: &ParentUnit) -> Result<()> {
        let mut units = self.units.write().unwrap();
        units.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn get(&self, id: ParentId) -> Result<Option<ParentUnit>> {
        let units = self.units.read().unwrap();
        Ok(units.get(&id).cloned())
    }

    async fn delete(&self, id: ParentId) -> Result<()> {
        let mut units = self.units.write().unwrap();
        units.remove(&id);
        Ok(())
    }

    async fn enumerate(&self) -> Result<Vec<ParentUnit>> {
        let units = self.units.read().unwrap();
        Ok(units.values().cloned().collect())
    }
}
