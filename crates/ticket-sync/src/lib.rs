//! Live ticket synchronization for the Helio client dashboard.
//!
//! This crate bridges the ticket repository's standing queries and a
//! consuming view. A [`TicketSync`] session owns the subscription
//! lifecycle for the viewer's ticket list and, while a ticket is open,
//! for its message thread; it reconciles incoming snapshots into local
//! view state and performs read-state transitions as a side effect of
//! viewing.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use memory_store::MemoryStore;
//! use tickets::{TicketRepository, Viewer};
//! use ticket_sync::{SyncEvent, TicketSync};
//!
//! # async fn example() -> Result<(), ticket_sync::SyncError> {
//! let repo = TicketRepository::new(Arc::new(MemoryStore::new()));
//! let viewer = Viewer::customer("u1", "u1@example.com");
//! let mut sync = TicketSync::start(repo, viewer).await?;
//!
//! while let Some(event) = sync.next_change().await {
//!     match event {
//!         SyncEvent::ListUpdated => println!("{} ticket(s)", sync.tickets().len()),
//!         SyncEvent::ThreadUpdated { .. } => println!("{} message(s)", sync.messages().len()),
//!         SyncEvent::ListLost | SyncEvent::ThreadLost { .. } => break,
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod controller;
mod error;

pub use config::SyncConfig;
pub use controller::{SyncEvent, TicketSync};
pub use error::SyncError;

// Re-export the repository types consumers wire in
pub use tickets::{
    Message, Ticket, TicketCounts, TicketError, TicketRepository, TicketStatus, Viewer,
};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
