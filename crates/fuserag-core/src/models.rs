pub mod document;
pub mod query;
pub mod workspace;

pub use document::{ChildUnit, DocumentInput, ParentId, ParentUnit, SourceMetadata};
pub use query::Intent;
pub use workspace::{IndexState, Workspace};
