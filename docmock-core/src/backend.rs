//! Storage backend abstraction for the mock store.
//!
//! References, batches and transactions never touch storage directly; they go through
//! a [`StoreBackend`]. Backends are cheap handles: cloning one yields another handle to
//! the same underlying data, which is how every reference observes every other
//! reference's writes.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    document::StoredDocument,
    error::StoreResult,
    path::Path,
    query::Query,
    write::{Write, WriteResult},
};

/// Abstract interface for document storage backends.
///
/// # Paths
///
/// Backends receive already validated paths: collection paths have an odd number of
/// segments and document paths an even number.
///
/// # Async Runtime
///
/// All data methods are async so that the public API mirrors a networked client.
/// In-memory implementations complete without ever suspending.
#[async_trait]
pub trait StoreBackend: Clone + Send + Sync + Debug + 'static {
    /// The project this store pretends to belong to.
    fn project_id(&self) -> &str;

    /// Returns `true` if `other` is a handle to the same underlying data as `self`.
    fn same_store(&self, other: &Self) -> bool;

    /// Ensures the collection at `path` exists, creating any missing intermediate
    /// collections and documents.
    ///
    /// This is idempotent and never modifies existing data.
    fn create_collection(&self, path: &Path) -> StoreResult<()>;

    /// Retrieves a disconnected copy of the document at `path`.
    ///
    /// Returns `Ok(None)` if no document exists there, including for intermediate
    /// documents that only host sub-collections.
    async fn get_document(&self, path: &Path) -> StoreResult<Option<StoredDocument>>;

    /// Lists collection ids, either at the root (`parent == None`) or under a document.
    ///
    /// Ids are returned in creation order.
    async fn list_collections(&self, parent: Option<&Path>) -> StoreResult<Vec<String>>;

    /// Lists the ids of every document node in a collection, in creation order.
    ///
    /// This includes documents that do not exist but host sub-collections.
    async fn list_documents(&self, collection: &Path) -> StoreResult<Vec<String>>;

    /// Returns the existing documents of a collection that match `query`, as
    /// `(id, document)` pairs.
    async fn query_documents(
        &self,
        collection: &Path,
        query: &Query,
    ) -> StoreResult<Vec<(String, StoredDocument)>>;

    /// Applies `writes` in order and returns one result per write.
    ///
    /// Application stops at the first failing write. Writes applied before the failure
    /// remain applied.
    async fn commit(&self, writes: Vec<Write>) -> StoreResult<Vec<WriteResult>>;

    /// Removes every collection and document.
    async fn reset(&self) -> StoreResult<()>;
}

/// Factory for configured backend instances.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> StoreResult<Self::Backend>;
}
