//! Write records shared by direct writes, batches and transactions.
//!
//! Every mutation in the store is expressed as a [`Write`]: a target document path and a
//! [`WriteOp`]. A reference applies a single write immediately, while [`WriteBatch`]
//! and [`Transaction`] queue writes and hand them to the backend on commit, where they
//! are applied in the order they were queued.
//!
//! A queued write remembers the store of the reference it was made from and is applied
//! there, even when that is not the store the batch was started on.
//!
//! [`WriteTarget`] is the capability shared by all three, so code under test can be
//! written once and run against either mutation strategy:
//!
//! ```ignore
//! async fn archive<W: WriteTarget<B>, B: StoreBackend>(
//!     target: &mut W,
//!     doc: &DocumentReference<B>,
//! ) -> StoreResult<()> {
//!     target.submit(Write::update(doc, doc! { "archived": true })).await
//! }
//!
//! archive(&mut client.clone(), &doc).await?;   // applied immediately
//!
//! let mut batch = client.batch();
//! archive(&mut batch, &doc).await?;            // applied on commit
//! batch.commit().await?;
//! ```
//!
//! [`WriteBatch`]: crate::batch::WriteBatch
//! [`Transaction`]: crate::transaction::Transaction

use async_trait::async_trait;
use bson::Document;
use chrono::{DateTime, Utc};

use crate::{
    backend::StoreBackend,
    error::StoreResult,
    fields::FieldUpdates,
    path::Path,
    reference::DocumentReference,
};

/// How a `set` combines new data with an existing document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SetOptions {
    /// Replace the document wholesale.
    #[default]
    Overwrite,
    /// Deep-merge the new data into the existing fields.
    Merge,
    /// Copy only the listed (dotted) field paths from the new data.
    MergeFields(Vec<String>),
}

impl SetOptions {
    pub fn merge() -> Self {
        SetOptions::Merge
    }

    pub fn merge_fields<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        SetOptions::MergeFields(fields.into_iter().map(Into::into).collect())
    }

    pub fn is_merge(&self) -> bool {
        !matches!(self, SetOptions::Overwrite)
    }
}

impl From<bool> for SetOptions {
    fn from(merge: bool) -> Self {
        if merge {
            SetOptions::Merge
        } else {
            SetOptions::Overwrite
        }
    }
}

/// The mutation carried by a [`Write`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace or merge the document, creating it if absent.
    Set { data: Document, options: SetOptions },
    /// Create the document, failing if it already exists.
    Create { data: Document },
    /// Partially update an existing document.
    Update { updates: FieldUpdates },
    /// Remove the document. Deleting an absent document is not an error.
    Delete,
}

impl WriteOp {
    pub fn kind(&self) -> &'static str {
        match self {
            WriteOp::Set { .. } => "set",
            WriteOp::Create { .. } => "create",
            WriteOp::Update { .. } => "update",
            WriteOp::Delete => "delete",
        }
    }
}

/// A pending mutation bound to a document path.
#[derive(Debug, Clone, PartialEq)]
pub struct Write {
    pub path: Path,
    pub op: WriteOp,
}

impl Write {
    pub fn set<B: StoreBackend>(reference: &DocumentReference<B>, data: Document) -> Self {
        Self::set_with_options(reference, data, SetOptions::Overwrite)
    }

    pub fn set_with_options<B: StoreBackend>(
        reference: &DocumentReference<B>,
        data: Document,
        options: SetOptions,
    ) -> Self {
        Self {
            path: reference.path().clone(),
            op: WriteOp::Set { data, options },
        }
    }

    pub fn create<B: StoreBackend>(reference: &DocumentReference<B>, data: Document) -> Self {
        Self {
            path: reference.path().clone(),
            op: WriteOp::Create { data },
        }
    }

    pub fn update<B: StoreBackend>(reference: &DocumentReference<B>, updates: impl Into<FieldUpdates>) -> Self {
        Self {
            path: reference.path().clone(),
            op: WriteOp::Update { updates: updates.into() },
        }
    }

    pub fn delete<B: StoreBackend>(reference: &DocumentReference<B>) -> Self {
        Self {
            path: reference.path().clone(),
            op: WriteOp::Delete,
        }
    }
}

/// The outcome of one applied write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    pub update_time: DateTime<Utc>,
}

/// Something that accepts writes: either applying them directly or queueing them.
#[async_trait]
pub trait WriteTarget<B: StoreBackend>: Send {
    /// Applies or queues a single write.
    ///
    /// # Errors
    ///
    /// Direct targets report the error of the applied write; queueing targets only fail
    /// when they refuse new writes.
    ///
    /// The write is addressed by path alone, so it is applied to the target's own store.
    async fn submit(&mut self, write: Write) -> StoreResult<()>;
}

/// Pending writes, each bound to the store of the reference it was made from.
///
/// On commit, consecutive writes to the same store are handed to that store as one
/// commit, so a queue whose references all share one store is applied in a single call.
#[derive(Debug)]
pub(crate) struct WriteQueue<B: StoreBackend> {
    writes: Vec<Write>,
    stores: Vec<B>,
}

impl<B: StoreBackend> WriteQueue<B> {
    pub fn new() -> Self {
        Self {
            writes: Vec::new(),
            stores: Vec::new(),
        }
    }

    pub fn push(&mut self, store: B, write: Write) {
        tracing::trace!(kind = write.op.kind(), path = %write.path, "queued write");
        self.writes.push(write);
        self.stores.push(store);
    }

    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Applies the writes in order, stopping at the first failure.
    pub async fn commit(self) -> StoreResult<Vec<WriteResult>> {
        let mut results = Vec::with_capacity(self.writes.len());
        let mut pending = self.writes
            .into_iter()
            .zip(self.stores)
            .peekable();

        while let Some((write, store)) = pending.next() {
            let mut run = vec![write];

            while let Some((write, _)) = pending.next_if(|(_, next)| next.same_store(&store)) {
                run.push(write);
            }

            results.extend(store.commit(run).await?);
        }

        Ok(results)
    }
}
