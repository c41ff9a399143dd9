//! Point-in-time document snapshots.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};

use crate::{
    backend::StoreBackend,
    document::{DocumentData, StoredDocument},
    error::StoreResult,
    fields::FieldPath,
    reference::DocumentReference,
};

/// A disconnected copy of a document as it was when read.
///
/// Later writes to the store never change a snapshot that has already been returned.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot<B: StoreBackend> {
    reference: DocumentReference<B>,
    document: Option<StoredDocument>,
    read_time: DateTime<Utc>,
}

impl<B: StoreBackend> DocumentSnapshot<B> {
    pub(crate) fn new(reference: DocumentReference<B>, document: Option<StoredDocument>) -> Self {
        Self {
            reference,
            document,
            read_time: Utc::now(),
        }
    }

    /// Returns `true` if the document existed when it was read.
    pub fn exists(&self) -> bool {
        self.document.is_some()
    }

    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn reference(&self) -> &DocumentReference<B> {
        &self.reference
    }

    /// Borrows the document fields, or `None` if the document did not exist.
    pub fn data(&self) -> Option<&Document> {
        self.document
            .as_ref()
            .map(|document| &document.fields)
    }

    /// Returns an owned copy of the document fields, or `None` if the document did not exist.
    pub fn to_dict(&self) -> Option<Document> {
        self.data().cloned()
    }

    /// Looks up a (dotted) field path. Malformed paths yield `None`.
    pub fn get(&self, field: &str) -> Option<&Bson> {
        let path = FieldPath::parse(field).ok()?;

        path.get(self.data()?)
    }

    /// Deserializes the document into `T`, or returns `None` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields do not match `T`.
    pub fn deserialize<T: DocumentData>(&self) -> StoreResult<Option<T>> {
        self.to_dict()
            .map(T::from_fields)
            .transpose()
    }

    pub fn create_time(&self) -> Option<DateTime<Utc>> {
        self.document
            .as_ref()
            .map(|document| document.create_time)
    }

    pub fn update_time(&self) -> Option<DateTime<Utc>> {
        self.document
            .as_ref()
            .map(|document| document.update_time)
    }

    pub fn read_time(&self) -> DateTime<Utc> {
        self.read_time
    }
}
