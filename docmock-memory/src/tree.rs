//! The nested collection/document tree behind [`InMemoryStore`](crate::InMemoryStore).
//!
//! Collections map document ids to document nodes, and document nodes carry their own
//! sub-collections. Maps preserve insertion order so enumerations are deterministic.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use docmock_core::{
    document::StoredDocument,
    error::{StoreError, StoreResult},
    path::Path,
    write::{Write, WriteOp, WriteResult},
};

pub(crate) type CollectionMap = IndexMap<String, CollectionNode>;

#[derive(Debug, Default, Clone)]
pub(crate) struct CollectionNode {
    pub documents: IndexMap<String, DocumentNode>,
}

/// A document position in the tree.
///
/// `data` is `None` for documents that were never written but host sub-collections.
#[derive(Debug, Default, Clone)]
pub(crate) struct DocumentNode {
    pub data: Option<StoredDocument>,
    pub collections: CollectionMap,
}

#[derive(Debug, Default)]
pub(crate) struct StoreTree {
    pub collections: CollectionMap,
}

impl StoreTree {
    /// Walks to the collection at `path`, creating missing nodes along the way.
    pub fn ensure_collection(&mut self, path: &Path) -> StoreResult<&mut CollectionNode> {
        let Some((last, parents)) = path.segments().split_last().filter(|_| path.is_collection()) else {
            return Err(StoreError::InvalidCollectionPath(path.to_string()));
        };
        let mut collections = &mut self.collections;

        for pair in parents.chunks_exact(2) {
            let document = collections
                .entry(pair[0].clone())
                .or_default()
                .documents
                .entry(pair[1].clone())
                .or_default();
            collections = &mut document.collections;
        }

        Ok(collections.entry(last.clone()).or_default())
    }

    pub fn collection(&self, path: &Path) -> Option<&CollectionNode> {
        let (last, parents) = path.segments().split_last()?;
        let mut collections = &self.collections;

        for pair in parents.chunks_exact(2) {
            collections = &collections
                .get(pair[0].as_str())?
                .documents
                .get(pair[1].as_str())?
                .collections;
        }

        collections.get(last.as_str())
    }

    /// Returns the collections under `parent`, or the root collections for `None`.
    pub fn collections(&self, parent: Option<&Path>) -> Option<&CollectionMap> {
        match parent {
            None => Some(&self.collections),
            Some(path) => Some(&self.document(path)?.collections),
        }
    }

    pub fn document(&self, path: &Path) -> Option<&DocumentNode> {
        if !path.is_document() {
            return None;
        }

        self.collection(&path.parent()?)?
            .documents
            .get(path.id())
    }

    /// Returns the node at `path`, creating it (and its ancestors) as a missing document.
    pub fn document_entry(&mut self, path: &Path) -> StoreResult<&mut DocumentNode> {
        let parent = path
            .parent()
            .filter(|_| path.is_document())
            .ok_or_else(|| StoreError::InvalidDocumentPath(path.to_string()))?;

        Ok(self
            .ensure_collection(&parent)?
            .documents
            .entry(path.id().to_string())
            .or_default())
    }

    /// Removes the node at `path` together with its sub-collections.
    pub fn remove_document(&mut self, path: &Path) -> StoreResult<Option<DocumentNode>> {
        let parent = path
            .parent()
            .filter(|_| path.is_document())
            .ok_or_else(|| StoreError::InvalidDocumentPath(path.to_string()))?;

        Ok(self
            .collection_mut(&parent)
            .and_then(|collection| collection.documents.shift_remove(path.id())))
    }

    /// Applies a single write.
    pub fn apply(&mut self, write: &Write, now: DateTime<Utc>) -> StoreResult<WriteResult> {
        let path = &write.path;

        match &write.op {
            WriteOp::Set { data, options } => {
                let existing = self.document(path).and_then(|node| node.data.as_ref());
                let next = StoredDocument::apply_set(existing, data, options, now)?;

                self.document_entry(path)?.data = Some(next);
            }
            WriteOp::Create { data } => {
                if self.document(path).is_some_and(|node| node.data.is_some()) {
                    return Err(StoreError::DocumentAlreadyExists(path.to_string()));
                }

                self.document_entry(path)?.data = Some(StoredDocument::new(data.clone(), now));
            }
            WriteOp::Update { updates } => {
                let document = self
                    .document_mut(path)
                    .and_then(|node| node.data.as_mut())
                    .ok_or_else(|| StoreError::DocumentNotFound(path.to_string()))?;

                document.apply_update(updates, now)?;
            }
            WriteOp::Delete => {
                self.remove_document(path)?;
            }
        }

        Ok(WriteResult { update_time: now })
    }

    fn collection_mut(&mut self, path: &Path) -> Option<&mut CollectionNode> {
        let (last, parents) = path.segments().split_last()?;
        let mut collections = &mut self.collections;

        for pair in parents.chunks_exact(2) {
            collections = &mut collections
                .get_mut(pair[0].as_str())?
                .documents
                .get_mut(pair[1].as_str())?
                .collections;
        }

        collections.get_mut(last.as_str())
    }

    fn document_mut(&mut self, path: &Path) -> Option<&mut DocumentNode> {
        if !path.is_document() {
            return None;
        }

        self.collection_mut(&path.parent()?)?
            .documents
            .get_mut(path.id())
    }
}
