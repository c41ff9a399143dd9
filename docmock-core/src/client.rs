//! The top-level client handle.
//!
//! A [`Client`] wraps a backend and hands out references, batches and transactions
//! that all share the backend's data.
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let client = Client::new(InMemoryStore::new());
//! let alice = client.document("users/alice")?;
//! alice.set(doc! { "name": "Alice" }).await?;
//!
//! let mut batch = client.batch();
//! batch.update(&alice, doc! { "age": 30 });
//! batch.commit().await?;
//! ```

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
    backend::StoreBackend,
    batch::WriteBatch,
    error::StoreResult,
    path::Path,
    reference::{CollectionReference, DocumentReference, snapshots_of},
    snapshot::DocumentSnapshot,
    stream::snapshot_stream,
    transaction::Transaction,
    write::{Write, WriteTarget},
};

/// Entry point to a store.
///
/// Cloning a client is cheap and yields another handle to the same data.
#[derive(Debug, Clone)]
pub struct Client<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> Client<B> {
    /// Creates a new client over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The project id reported by the backend.
    pub fn project(&self) -> &str {
        self.backend.project_id()
    }

    /// Opens the collection at a slash-delimited path, creating it and any missing
    /// intermediate collections and documents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCollectionPath`](crate::error::StoreError::InvalidCollectionPath) if the path has an even number of
    /// segments.
    pub fn collection(&self, path: &str) -> StoreResult<CollectionReference<B>> {
        CollectionReference::open(self.backend.clone(), Path::collection(path)?)
    }

    /// Returns a reference to the document at a slash-delimited path. Its parent
    /// collection is created; the document is not.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocumentPath`](crate::error::StoreError::InvalidDocumentPath) if the path has an odd number of
    /// segments.
    pub fn document(&self, path: &str) -> StoreResult<DocumentReference<B>> {
        DocumentReference::open(self.backend.clone(), Path::document(path)?)
    }

    /// Streams the root collections in creation order.
    pub fn collections(&self) -> BoxStream<'static, StoreResult<CollectionReference<B>>> {
        let client = self.clone();

        snapshot_stream(async move {
            let names = client.backend.list_collections(None).await?;
            let collections = names
                .iter()
                .map(|name| client.collection(name))
                .collect::<StoreResult<Vec<_>>>()?;

            StoreResult::Ok(collections)
        })
    }

    /// Streams snapshots of `references`.
    ///
    /// References with the same path are read once, at the position of their first
    /// occurrence. Each document is read when the stream reaches it.
    pub fn get_all(
        &self,
        references: impl IntoIterator<Item = DocumentReference<B>>,
    ) -> BoxStream<'static, StoreResult<DocumentSnapshot<B>>> {
        snapshots_of(references)
    }

    /// Starts a new, empty batch on this store.
    pub fn batch(&self) -> WriteBatch<B> {
        WriteBatch::new(self.backend.clone())
    }

    /// Starts a new transaction on this store.
    pub fn transaction(&self) -> Transaction<B> {
        Transaction::new(self.backend.clone())
    }

    /// Removes every collection and document.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to reset.
    pub async fn reset(&self) -> StoreResult<()> {
        self.backend.reset().await
    }
}

/// Applies writes immediately.
#[async_trait]
impl<B: StoreBackend> WriteTarget<B> for Client<B> {
    async fn submit(&mut self, write: Write) -> StoreResult<()> {
        self.backend.commit(vec![write]).await?;

        Ok(())
    }
}
