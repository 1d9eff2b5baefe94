//! In-memory document store backend.
//!
//! This crate provides [`MemoryStore`], a working in-process
//! implementation of the [`DocumentStore`] contract for tests and
//! examples:
//!
//! - per-collection document maps with store-assigned UUID ids
//! - a strictly increasing server clock for `ServerTime` fields
//! - live standing queries: every committed write re-evaluates each
//!   subscription over the affected collection and pushes a fresh full
//!   snapshot
//! - test hooks for injecting write and subscribe failures
//!
//! For production the dashboard talks to a remote store behind the same
//! trait; nothing downstream depends on this backend.
//!
//! # Example
//!
//! ```rust
//! use memory_store::MemoryStore;
//! use store_core::{CollectionRef, DocumentStore, Query, WriteFields};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), store_core::StoreError> {
//!     let store = MemoryStore::new();
//!     let tickets = CollectionRef::new("tickets")?;
//!
//!     let id = store
//!         .create(&tickets, WriteFields::new().field("status", "open"))
//!         .await?;
//!
//!     let mut watch = store.subscribe(Query::collection(tickets)).await?;
//!     let snapshot = watch.next().await.expect("initial snapshot");
//!     assert_eq!(snapshot.docs[0].id, id);
//!     Ok(())
//! }
//! ```

mod store;

pub use store::MemoryStore;

// Re-export store-core types for convenience
pub use store_core::{
    async_trait, CollectionRef, Direction, Document, DocumentStore, Filter, OrderBy, Query,
    Snapshot, StoreError, Unsubscribe, Watch, WriteFields, WriteValue,
};
