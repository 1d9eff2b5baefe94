//! Sync controller error types.

use thiserror::Error;

use tickets::TicketError;

/// Errors that can occur during ticket synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A repository operation failed.
    #[error(transparent)]
    Ticket(#[from] TicketError),

    /// A thread operation was issued while no ticket thread is open.
    #[error("no ticket thread is open")]
    NotViewing,
}
