//! Read-then-write transactions.
//!
//! A [`Transaction`] reads straight from the store and queues its writes like a
//! [`WriteBatch`](crate::batch::WriteBatch). As with the real service, all reads must
//! happen before the first write. There is no conflict detection: concurrent writers
//! are not modeled, and a commit applies the queued writes unconditionally.
//!
//! ```ignore
//! let mut tx = client.transaction();
//! let snapshot = tx.get(&counter).await?;
//! let value = snapshot.get("value").and_then(Bson::as_i32).unwrap_or(0);
//! tx.set(&counter, doc! { "value": value + 1 });
//! tx.commit().await?;
//! ```

use async_trait::async_trait;
use bson::Document;
use futures::stream::TryStreamExt;

use crate::{
    backend::StoreBackend,
    error::{StoreError, StoreResult},
    fields::FieldUpdates,
    reference::{DocumentReference, snapshots_of},
    snapshot::DocumentSnapshot,
    write::{SetOptions, Write, WriteQueue, WriteResult, WriteTarget},
};

#[derive(Debug)]
pub struct Transaction<B: StoreBackend> {
    backend: B,
    queue: WriteQueue<B>,
}

impl<B: StoreBackend> Transaction<B> {
    pub(crate) fn new(backend: B) -> Self {
        Self {
            backend,
            queue: WriteQueue::new(),
        }
    }

    /// Reads a document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if a write has already been queued.
    pub async fn get(&self, reference: &DocumentReference<B>) -> StoreResult<DocumentSnapshot<B>> {
        self.ensure_readable()?;

        reference.get().await
    }

    /// Reads several documents, de-duplicated by path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if a write has already been queued.
    pub async fn get_all(
        &self,
        references: impl IntoIterator<Item = DocumentReference<B>>,
    ) -> StoreResult<Vec<DocumentSnapshot<B>>> {
        self.ensure_readable()?;

        snapshots_of(references).try_collect().await
    }

    pub fn set(&mut self, reference: &DocumentReference<B>, data: Document) -> &mut Self {
        self.push(reference, Write::set(reference, data))
    }

    pub fn set_with_options(
        &mut self,
        reference: &DocumentReference<B>,
        data: Document,
        options: impl Into<SetOptions>,
    ) -> &mut Self {
        self.push(reference, Write::set_with_options(reference, data, options.into()))
    }

    pub fn create(&mut self, reference: &DocumentReference<B>, data: Document) -> &mut Self {
        self.push(reference, Write::create(reference, data))
    }

    pub fn update(&mut self, reference: &DocumentReference<B>, updates: impl Into<FieldUpdates>) -> &mut Self {
        self.push(reference, Write::update(reference, updates))
    }

    pub fn delete(&mut self, reference: &DocumentReference<B>) -> &mut Self {
        self.push(reference, Write::delete(reference))
    }

    /// Applies the queued writes in order and consumes the transaction.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing write. Earlier writes are not rolled back.
    pub async fn commit(self) -> StoreResult<Vec<WriteResult>> {
        tracing::debug!(writes = self.queue.len(), "committing transaction");

        self.queue.commit().await
    }

    /// Discards the queued writes.
    pub fn rollback(self) {
        tracing::debug!(writes = self.queue.len(), "rolled back transaction");
    }

    fn ensure_readable(&self) -> StoreResult<()> {
        if !self.queue.is_empty() {
            return Err(StoreError::InvalidArgument(
                "transactions require all reads to be executed before all writes".to_string(),
            ));
        }

        Ok(())
    }

    fn push(&mut self, reference: &DocumentReference<B>, write: Write) -> &mut Self {
        self.queue.push(reference.backend().clone(), write);
        self
    }
}

#[async_trait]
impl<B: StoreBackend> WriteTarget<B> for Transaction<B> {
    async fn submit(&mut self, write: Write) -> StoreResult<()> {
        self.queue.push(self.backend.clone(), write);

        Ok(())
    }
}
