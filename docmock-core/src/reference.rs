//! Document and collection references.
//!
//! A reference is a lightweight handle made of a backend handle and a [`Path`]. It
//! holds no data of its own: every read goes to the backend and every write is applied
//! there immediately. Two references with equal paths address the same location and
//! observe each other's writes.
//!
//! # Example
//!
//! ```ignore
//! use bson::doc;
//!
//! let cities = client.collection("cities")?;
//! let sf = cities.document("SF")?;
//!
//! sf.set(doc! { "name": "San Francisco", "population": 860_000 }).await?;
//! sf.update(doc! { "population": 870_000 }).await?;
//!
//! let snapshot = sf.get().await?;
//! assert!(snapshot.exists());
//! ```

use bson::Document;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

use crate::{
    backend::StoreBackend,
    document::DocumentData,
    error::{StoreError, StoreResult},
    fields::FieldUpdates,
    path::Path,
    query::Query,
    snapshot::DocumentSnapshot,
    stream::snapshot_stream,
    write::{SetOptions, Write, WriteResult},
};

/// A handle to a collection.
///
/// Obtained from [`Client::collection`](crate::client::Client::collection) or
/// [`DocumentReference::collection`]; obtaining one ensures the collection exists.
#[derive(Debug, Clone)]
pub struct CollectionReference<B: StoreBackend> {
    backend: B,
    path: Path,
}

impl<B: StoreBackend> CollectionReference<B> {
    /// Ensures the collection at `path` exists and returns a handle to it.
    pub(crate) fn open(backend: B, path: Path) -> StoreResult<Self> {
        if !path.is_collection() {
            return Err(StoreError::InvalidCollectionPath(path.to_string()));
        }

        backend.create_collection(&path)?;
        tracing::trace!(path = %path, "opened collection");

        Ok(Self { backend, path })
    }

    /// Returns the collection id (the last path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the document hosting this collection, or `None` for a root collection.
    pub fn parent(&self) -> Option<DocumentReference<B>> {
        self.path
            .parent()
            .filter(Path::is_document)
            .map(|path| DocumentReference::new(self.backend.clone(), path))
    }

    /// Returns a reference to a document in this collection.
    ///
    /// `id` may also be a relative path reaching into a sub-collection
    /// (`"doc/messages/m1"`). No storage is created until the document is written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocumentPath`] if `id` does not resolve to a document.
    pub fn document(&self, id: &str) -> StoreResult<DocumentReference<B>> {
        let path = self.path.join(&Path::parse(id));

        if !path.is_document() {
            return Err(StoreError::InvalidDocumentPath(format!("{}/{id}", self.path)));
        }

        Ok(DocumentReference::new(self.backend.clone(), path))
    }

    /// Returns a reference to a new document with a generated id.
    pub fn new_document(&self) -> DocumentReference<B> {
        let id = Uuid::new_v4().simple().to_string();

        DocumentReference::new(self.backend.clone(), self.path.child(id))
    }

    /// Creates a document with a generated id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn add(&self, data: Document) -> StoreResult<(WriteResult, DocumentReference<B>)> {
        let reference = self.new_document();
        let result = reference.create(data).await?;

        Ok((result, reference))
    }

    /// Streams references to every document node in this collection, including
    /// documents that do not exist but host sub-collections.
    pub fn list_documents(&self) -> BoxStream<'static, StoreResult<DocumentReference<B>>> {
        let backend = self.backend.clone();
        let path = self.path.clone();

        snapshot_stream(async move {
            let ids = backend.list_documents(&path).await?;

            let references = ids
                .into_iter()
                .map(|id| DocumentReference::new(backend.clone(), path.child(id)))
                .collect::<Vec<_>>();

            StoreResult::Ok(references)
        })
    }

    /// Streams snapshots of the existing documents matching `query`.
    pub fn query(&self, query: Query) -> BoxStream<'static, StoreResult<DocumentSnapshot<B>>> {
        let backend = self.backend.clone();
        let path = self.path.clone();

        snapshot_stream(async move {
            let documents = backend.query_documents(&path, &query).await?;

            let snapshots = documents
                .into_iter()
                .map(|(id, document)| {
                    let reference = DocumentReference::new(backend.clone(), path.child(id));
                    DocumentSnapshot::new(reference, Some(document))
                })
                .collect::<Vec<_>>();

            StoreResult::Ok(snapshots)
        })
    }

    /// Streams snapshots of every existing document in this collection.
    pub fn stream(&self) -> BoxStream<'static, StoreResult<DocumentSnapshot<B>>> {
        self.query(Query::default())
    }

    /// Collects snapshots of every existing document in this collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    pub async fn get(&self) -> StoreResult<Vec<DocumentSnapshot<B>>> {
        self.stream().try_collect().await
    }
}

impl<B: StoreBackend> PartialEq for CollectionReference<B> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<B: StoreBackend> Eq for CollectionReference<B> {}

impl<B: StoreBackend> Hash for CollectionReference<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// A handle to a single document, which may or may not exist.
#[derive(Debug, Clone)]
pub struct DocumentReference<B: StoreBackend> {
    backend: B,
    path: Path,
}

impl<B: StoreBackend> DocumentReference<B> {
    pub(crate) fn new(backend: B, path: Path) -> Self {
        Self { backend, path }
    }

    pub(crate) fn backend(&self) -> &B {
        &self.backend
    }

    /// Ensures the parent collection of `path` exists and returns a handle to the
    /// document. The document itself is not created.
    pub(crate) fn open(backend: B, path: Path) -> StoreResult<Self> {
        let parent = path
            .parent()
            .filter(|_| path.is_document())
            .ok_or_else(|| StoreError::InvalidDocumentPath(path.to_string()))?;

        backend.create_collection(&parent)?;

        Ok(Self { backend, path })
    }

    /// Returns the document id (the last path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the collection containing this document.
    pub fn parent(&self) -> StoreResult<CollectionReference<B>> {
        let path = self.path
            .parent()
            .ok_or_else(|| StoreError::InvalidDocumentPath(self.path.to_string()))?;

        CollectionReference::open(self.backend.clone(), path)
    }

    /// Returns a sub-collection of this document, creating it if needed.
    ///
    /// `name` may be a relative path (`"messages/m1/reactions"`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCollectionPath`] if `name` does not resolve to a
    /// collection.
    pub fn collection(&self, name: &str) -> StoreResult<CollectionReference<B>> {
        let path = self.path.join(&Path::parse(name));

        if !path.is_collection() {
            return Err(StoreError::InvalidCollectionPath(format!("{}/{name}", self.path)));
        }

        CollectionReference::open(self.backend.clone(), path)
    }

    /// Streams the sub-collections of this document.
    pub fn collections(&self) -> BoxStream<'static, StoreResult<CollectionReference<B>>> {
        let backend = self.backend.clone();
        let path = self.path.clone();

        snapshot_stream(async move {
            let ids = backend.list_collections(Some(&path)).await?;

            let collections = ids
                .into_iter()
                .map(|id| CollectionReference { backend: backend.clone(), path: path.child(id) })
                .collect::<Vec<_>>();

            StoreResult::Ok(collections)
        })
    }

    /// Reads the document.
    ///
    /// The snapshot is a copy: later writes do not change it. A missing document
    /// yields a snapshot whose [`exists`](DocumentSnapshot::exists) is `false`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend read fails.
    pub async fn get(&self) -> StoreResult<DocumentSnapshot<B>> {
        let document = self.backend.get_document(&self.path).await?;

        Ok(DocumentSnapshot::new(self.clone(), document))
    }

    /// Replaces the document with `data`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn set(&self, data: Document) -> StoreResult<WriteResult> {
        self.write(Write::set(self, data)).await
    }

    /// Writes `data` using the given merge behaviour, creating the document if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if a merge field is malformed or absent
    /// from `data`.
    pub async fn set_with_options(&self, data: Document, options: impl Into<SetOptions>) -> StoreResult<WriteResult> {
        self.write(Write::set_with_options(self, data, options.into())).await
    }

    /// Serializes `value` and writes it as the whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` does not serialize to a map or the write fails.
    pub async fn set_typed<T: DocumentData>(&self, value: &T) -> StoreResult<WriteResult> {
        self.set(value.to_fields()?).await
    }

    /// Creates the document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentAlreadyExists`] if the document exists.
    pub async fn create(&self, data: Document) -> StoreResult<WriteResult> {
        self.write(Write::create(self, data)).await
    }

    /// Updates fields of an existing document.
    ///
    /// Keys are dotted field paths; see [`FieldUpdates`] for transforms.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DocumentNotFound`] if the document does not exist.
    pub async fn update(&self, updates: impl Into<FieldUpdates>) -> StoreResult<WriteResult> {
        self.write(Write::update(self, updates)).await
    }

    /// Deletes the document. Deleting a missing document succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend write fails.
    pub async fn delete(&self) -> StoreResult<WriteResult> {
        self.write(Write::delete(self)).await
    }

    async fn write(&self, write: Write) -> StoreResult<WriteResult> {
        self.backend
            .commit(vec![write])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidArgument(format!("no write result for {}", self.path)))
    }
}

impl<B: StoreBackend> PartialEq for DocumentReference<B> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl<B: StoreBackend> Eq for DocumentReference<B> {}

impl<B: StoreBackend> Hash for DocumentReference<B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

/// Helper to stream snapshots of `references`, reading each one only when the stream
/// reaches it. Duplicate paths are read once, at their first position.
pub(crate) fn snapshots_of<B: StoreBackend>(
    references: impl IntoIterator<Item = DocumentReference<B>>,
) -> BoxStream<'static, StoreResult<DocumentSnapshot<B>>> {
    let mut seen = std::collections::HashSet::new();
    let unique = references
        .into_iter()
        .filter(|reference| seen.insert(reference.path.clone()))
        .collect::<Vec<_>>();

    futures::stream::iter(unique)
        .then(|reference| async move { reference.get().await })
        .boxed()
}
