//! Batched writes.
//!
//! A [`WriteBatch`] records mutations instead of applying them. Nothing reaches the
//! store until [`WriteBatch::commit`], which replays the queued writes in the order
//! they were added. The batch shares its store with the client that created it, so
//! committed writes are visible through every reference. Each write is applied to the
//! store of the reference it was queued with.
//!
//! # Atomicity
//!
//! The backend applies a batch whose references share one store under a single write
//! lock, so no reader ever observes a half-applied batch. There is no rollback, however: if a write fails
//! part-way (for example an update of a document deleted earlier in the same batch),
//! the writes before it stay applied and the remaining ones are skipped.
//!
//! ```ignore
//! let mut batch = client.batch();
//! batch
//!     .set(&cities.document("SF")?, doc! { "name": "San Francisco" })
//!     .update(&cities.document("LA")?, doc! { "population": 3_900_000 })
//!     .delete(&cities.document("DEN")?);
//! batch.commit().await?;
//! ```

use async_trait::async_trait;
use bson::Document;

use crate::{
    backend::StoreBackend,
    error::StoreResult,
    fields::FieldUpdates,
    path::Path,
    reference::{CollectionReference, DocumentReference},
    write::{SetOptions, Write, WriteQueue, WriteResult, WriteTarget},
};

/// An ordered queue of pending writes bound to a store.
#[derive(Debug)]
pub struct WriteBatch<B: StoreBackend> {
    backend: B,
    queue: WriteQueue<B>,
}

impl<B: StoreBackend> WriteBatch<B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            queue: WriteQueue::new(),
        }
    }

    /// Starts another, independent batch on the same store.
    ///
    /// The writes already queued on `self` are left untouched; both batches can be
    /// committed separately, in any order.
    pub fn batch(&self) -> WriteBatch<B> {
        WriteBatch::new(self.backend.clone())
    }

    /// Opens a collection on the batch's store. See
    /// [`Client::collection`](crate::client::Client::collection).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCollectionPath`](crate::error::StoreError::InvalidCollectionPath)
    /// if the path has an even number of segments.
    pub fn collection(&self, path: &str) -> StoreResult<CollectionReference<B>> {
        CollectionReference::open(self.backend.clone(), Path::collection(path)?)
    }

    /// Returns a document reference on the batch's store. See
    /// [`Client::document`](crate::client::Client::document).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocumentPath`](crate::error::StoreError::InvalidDocumentPath)
    /// if the path has an odd number of segments.
    pub fn document(&self, path: &str) -> StoreResult<DocumentReference<B>> {
        DocumentReference::open(self.backend.clone(), Path::document(path)?)
    }

    /// Queues a write replacing the document with `data`.
    pub fn set(&mut self, reference: &DocumentReference<B>, data: Document) -> &mut Self {
        self.push(reference, Write::set(reference, data))
    }

    /// Queues a write using the given merge behaviour.
    pub fn set_with_options(
        &mut self,
        reference: &DocumentReference<B>,
        data: Document,
        options: impl Into<SetOptions>,
    ) -> &mut Self {
        self.push(reference, Write::set_with_options(reference, data, options.into()))
    }

    /// Queues a write creating the document; the commit fails if it exists by then.
    pub fn create(&mut self, reference: &DocumentReference<B>, data: Document) -> &mut Self {
        self.push(reference, Write::create(reference, data))
    }

    /// Queues a partial update; the commit fails if the document is missing by then.
    pub fn update(&mut self, reference: &DocumentReference<B>, updates: impl Into<FieldUpdates>) -> &mut Self {
        self.push(reference, Write::update(reference, updates))
    }

    /// Queues a delete.
    pub fn delete(&mut self, reference: &DocumentReference<B>) -> &mut Self {
        self.push(reference, Write::delete(reference))
    }

    /// Returns the number of queued writes.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the queued writes in commit order.
    pub fn writes(&self) -> &[Write] {
        self.queue.writes()
    }

    /// Applies every queued write in order and consumes the batch.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing write. Writes queued before it remain
    /// applied; see the module documentation.
    pub async fn commit(self) -> StoreResult<Vec<WriteResult>> {
        tracing::debug!(writes = self.queue.len(), "committing batch");

        self.queue.commit().await
    }

    fn push(&mut self, reference: &DocumentReference<B>, write: Write) -> &mut Self {
        self.queue.push(reference.backend().clone(), write);
        self
    }
}

#[async_trait]
impl<B: StoreBackend> WriteTarget<B> for WriteBatch<B> {
    async fn submit(&mut self, write: Write) -> StoreResult<()> {
        self.queue.push(self.backend.clone(), write);

        Ok(())
    }
}
