//! The `DocumentStore` trait definition.

use async_trait::async_trait;

use crate::document::{CollectionRef, Document, WriteFields};
use crate::error::StoreError;
use crate::query::Query;
use crate::watch::Watch;

/// A remote, multi-reader/multi-writer document database.
///
/// Documents are grouped into collections addressed by [`CollectionRef`]
/// paths. Concurrent writers to the same document resolve per-field with
/// last-writer-wins semantics; no operation spans more than one document.
///
/// This trait is object-safe and can be used with `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a store-assigned id and return that id.
    /// [`WriteValue::ServerTime`](crate::WriteValue::ServerTime) fields
    /// resolve to the store's clock at commit.
    async fn create(
        &self,
        collection: &CollectionRef,
        fields: WriteFields,
    ) -> Result<String, StoreError>;

    /// Read one document. Returns `None` if it does not exist.
    async fn get(
        &self,
        collection: &CollectionRef,
        id: &str,
    ) -> Result<Option<Document>, StoreError>;

    /// Write fields of one document.
    ///
    /// With `merge` the named fields are updated in place and the rest
    /// are kept; the document must already exist. Without `merge` the
    /// payload replaces the whole document, creating it if necessary.
    async fn set(
        &self,
        collection: &CollectionRef,
        id: &str,
        fields: WriteFields,
        merge: bool,
    ) -> Result<(), StoreError>;

    /// Delete one document. Deleting a document that does not exist is a
    /// no-op; documents in its sub-collections are not touched.
    async fn delete(&self, collection: &CollectionRef, id: &str) -> Result<(), StoreError>;

    /// Run a point-in-time query.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Establish a standing query.
    ///
    /// The returned [`Watch`] delivers the full current result set on
    /// every relevant committed change, starting with the initial state,
    /// until it is cancelled or dropped.
    async fn subscribe(&self, query: Query) -> Result<Watch, StoreError>;
}
