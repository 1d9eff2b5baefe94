//! Support ticket repository.
//!
//! Typed, minimal-surface access to ticket and message persistence for
//! the Helio client dashboard. The repository holds no business rules
//! beyond field shaping; it translates domain operations into document
//! store writes and standing queries:
//!
//! - [`TicketRepository`] - create/subscribe/update/delete operations
//! - [`Ticket`] / [`Message`] - the persisted domain types
//! - [`Viewer`] - the explicit acting identity (no ambient current user)
//! - [`TicketWatch`] / [`MessageWatch`] - live, typed query results
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use memory_store::MemoryStore;
//! use tickets::{TicketRepository, Viewer};
//!
//! # async fn example() -> Result<(), tickets::TicketError> {
//! let repo = TicketRepository::new(Arc::new(MemoryStore::new()));
//! let customer = Viewer::customer("u1", "u1@example.com");
//!
//! let id = repo
//!     .create_ticket(&customer, "Billing question", "Why was I charged twice?")
//!     .await?;
//!
//! let mut watch = repo.subscribe_tickets(&customer).await?;
//! while let Some(list) = watch.next().await {
//!     println!("{} ticket(s)", list.len());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod models;
mod repository;
mod watch;

pub use error::{Result, TicketError};
pub use models::{Message, Ticket, TicketCounts, TicketStatus, Viewer};
pub use repository::TicketRepository;
pub use watch::{MessageWatch, TicketWatch};

// Re-export the store contract types callers commonly need
pub use store_core::{DocumentStore, StoreError, Unsubscribe};
