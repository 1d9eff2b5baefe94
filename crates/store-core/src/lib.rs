//! Core trait and types for document store backends.
//!
//! This crate provides the shared interface between the Helio dashboard
//! crates and whatever document database backs them. It defines:
//!
//! - [`DocumentStore`] - The trait that all store backends must implement
//! - [`Document`] / [`WriteFields`] - Read and write shapes for documents
//! - [`Query`] - Point-in-time and standing query descriptions
//! - [`Watch`] / [`Unsubscribe`] - The live end of a standing query
//! - [`StoreError`] - Error types for store operations
//!
//! The store itself is remote and multi-writer; this crate deliberately
//! contains no networking or persistence code. Backends live in sibling
//! crates (e.g. `memory-store`).
//!
//! # Example
//!
//! ```rust
//! use store_core::{CollectionRef, Query, WriteFields};
//!
//! let tickets = CollectionRef::new("tickets")?;
//! let fields = WriteFields::new()
//!     .field("subject", "Billing question")
//!     .server_time("createdAt");
//! let query = Query::collection(tickets).order_by_desc("createdAt");
//! # Ok::<(), store_core::StoreError>(())
//! ```

mod document;
mod error;
mod query;
mod trait_def;
mod watch;

pub use document::{CollectionRef, Document, WriteFields, WriteValue};
pub use error::{Result, StoreError};
pub use query::{Direction, Filter, OrderBy, Query};
pub use trait_def::DocumentStore;
pub use watch::{Snapshot, Unsubscribe, Watch};

// Re-export async_trait for backend implementations
pub use async_trait::async_trait;
