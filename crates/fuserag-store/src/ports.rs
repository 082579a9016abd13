use async_trait::async_trait;
use fuserag_core::error::Result;
use fuserag_core::models::{ParentId, ParentUnit};

/// Port for durable parent unit storage, scoped to one workspace.
///
/// The parent store is the single source of truth for a workspace's
/// corpus: both retrieval indices are derivable from it, never the
/// reverse.
#[async_trait]
pub trait ParentStore: Send + Sync {
    /// Store a parent unit under its id, overwriting any existing record
    async fn put(&self, unit: &ParentUnit) -> Result<()>;

    /// Retrieve a parent unit by id
    async fn get(&self, id: ParentId) -> Result<Option<ParentUnit>>;

    /// Delete a parent unit by id. Deleting an absent id is a no-op.
    async fn delete(&self, id: ParentId) -> Result<()>;

    /// Enumerate all stored parent units.
    ///
    /// Must reflect every put/delete completed before the call returns.
    async fn enumerate(&self) -> Result<Vec<ParentUnit>>;
}
