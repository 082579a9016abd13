//! FuseRAG Store - Durable parent unit storage
//!
//! This crate defines the `ParentStore` port and its adapters: an
//! in-memory store for development and testing, and a filesystem store
//! holding one durable record per parent unit key.

pub mod fs;
pub mod memory;
pub mod ports;

pub use fs::FsParentStore;
pub use memory::MemoryParentStore;
pub use ports::ParentStore;
