//! Ticket repository error types.

use thiserror::Error;

use store_core::StoreError;

/// Errors that can occur during ticket operations.
#[derive(Debug, Error)]
pub enum TicketError {
    /// The underlying document store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A stored document does not match the expected shape.
    #[error("invalid {collection} document {id}: {reason}")]
    Decode {
        collection: &'static str,
        id: String,
        reason: String,
    },
}

/// Result type for ticket operations.
pub type Result<T> = std::result::Result<T, TicketError>;
