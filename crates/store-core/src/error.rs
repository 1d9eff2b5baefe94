//! Error types for document store operations.

use thiserror::Error;

/// Errors that can occur when talking to a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A create, update or delete was rejected (permission, network, quota).
    #[error("write failed: {reason}")]
    Write { reason: String },

    /// A standing query could not be established or was interrupted.
    #[error("subscribe failed: {reason}")]
    Subscribe { reason: String },

    /// The addressed document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A collection path was malformed.
    #[error("invalid collection path: {0:?}")]
    InvalidPath(String),
}

impl StoreError {
    /// Shorthand for a [`StoreError::Write`] with the given reason.
    pub fn write(reason: impl Into<String>) -> Self {
        Self::Write {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`StoreError::Subscribe`] with the given reason.
    pub fn subscribe(reason: impl Into<String>) -> Self {
        Self::Subscribe {
            reason: reason.into(),
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
