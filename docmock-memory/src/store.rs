//! In-memory storage implementation for the mock store.
//!
//! This module provides the in-memory backend that keeps collections and documents in
//! a nested tree behind a synchronous read-write lock.

use std::sync::Arc;
use async_trait::async_trait;
use bson::{Bson, Document, ser::serialize_to_bson};
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use docmock_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::StoredDocument,
    error::{StoreError, StoreResult},
    path::Path,
    query::Query,
    write::{SetOptions, Write, WriteOp, WriteResult},
};

use crate::{evaluator::DocumentEvaluator, tree::StoreTree};

/// Project id reported when none is configured.
pub const DEFAULT_PROJECT_ID: &str = "mock-project";


/// Thread-safe in-memory document storage backend.
///
/// This struct implements the [`StoreBackend`] trait on top of a nested
/// collection/document tree.
///
/// # Thread Safety
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data. The lock is only ever held for the duration of a
/// single backend call and never across an `.await`.
///
/// # Performance
///
/// Queries scan all documents in a collection (no indexing).
///
/// # Example
///
/// ```ignore
/// use docmock_memory::InMemoryStore;
/// use docmock::client::Client;
/// use bson::doc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = Client::new(InMemoryStore::new());
///
///     client.document("users/alice")?.set(doc! { "name": "Alice" }).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    tree: Arc<RwLock<StoreTree>>,
    project_id: Arc<str>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::with_tree(DEFAULT_PROJECT_ID, StoreTree::default())
    }
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryStore` with custom options.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use docmock_memory::InMemoryStore;
    ///
    /// let store = InMemoryStore::builder()
    ///     .project_id("test-project")
    ///     .build()
    ///     .await?;
    /// ```
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn with_tree(project_id: &str, tree: StoreTree) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
            project_id: Arc::from(project_id),
        }
    }

    /// Renders the existing documents of every root collection as JSON.
    ///
    /// The shape is `{collection: {document_id: fields}}`. Sub-collections and
    /// documents that only host sub-collections are left out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if a field value has no JSON form.
    pub fn dump(&self) -> StoreResult<Value> {
        let tree = self.tree.read();
        let mut root = Map::new();

        for (name, collection) in &tree.collections {
            let mut documents = Map::new();

            for (id, node) in &collection.documents {
                if let Some(document) = &node.data {
                    documents.insert(
                        id.clone(),
                        serde_json::to_value(Bson::Document(document.fields.clone()))?,
                    );
                }
            }

            root.insert(name.clone(), Value::Object(documents));
        }

        Ok(Value::Object(root))
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn same_store(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree)
    }

    fn create_collection(&self, path: &Path) -> StoreResult<()> {
        tracing::trace!(%path, "ensuring collection");
        self.tree.write().ensure_collection(path)?;

        Ok(())
    }

    async fn get_document(&self, path: &Path) -> StoreResult<Option<StoredDocument>> {
        Ok(
            self.tree
                .read()
                .document(path)
                .and_then(|node| node.data.clone())
        )
    }

    async fn list_collections(&self, parent: Option<&Path>) -> StoreResult<Vec<String>> {
        Ok(
            self.tree
                .read()
                .collections(parent)
                .map(|collections| collections.keys().cloned().collect())
                .unwrap_or_default()
        )
    }

    async fn list_documents(&self, collection: &Path) -> StoreResult<Vec<String>> {
        Ok(
            self.tree
                .read()
                .collection(collection)
                .map(|node| node.documents.keys().cloned().collect())
                .unwrap_or_default()
        )
    }

    async fn query_documents(
        &self,
        collection: &Path,
        query: &Query,
    ) -> StoreResult<Vec<(String, StoredDocument)>> {
        let tree = self.tree.read();
        let Some(node) = tree.collection(collection) else {
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();

        for (id, document) in &node.documents {
            let Some(document) = &document.data else {
                continue;
            };

            if let Some(filter) = &query.filter {
                if !DocumentEvaluator::new(&document.fields).evaluate(filter)? {
                    continue;
                }
            }

            if !DocumentEvaluator::has_sort_fields(&document.fields, &query.sort) {
                continue;
            }

            matches.push((id.clone(), document.clone()));
        }

        // Stable, so ties keep insertion order
        if !query.sort.is_empty() {
            matches.sort_by(|(_, a), (_, b)| DocumentEvaluator::compare(&a.fields, &b.fields, &query.sort));
        }

        Ok(
            matches
                .into_iter()
                .skip(query.offset.unwrap_or(0))
                .take(query.limit.unwrap_or(usize::MAX))
                .collect()
        )
    }

    async fn commit(&self, writes: Vec<Write>) -> StoreResult<Vec<WriteResult>> {
        let now = Utc::now();
        let mut tree = self.tree.write();
        let mut results = Vec::with_capacity(writes.len());

        for (index, write) in writes.iter().enumerate() {
            tracing::trace!(kind = write.op.kind(), path = %write.path, "applying write");

            match tree.apply(write, now) {
                Ok(result) => results.push(result),
                Err(error) => {
                    tracing::debug!(index, applied = results.len(), %error, "commit stopped at failing write");
                    return Err(error);
                }
            }
        }

        tracing::debug!(writes = results.len(), "committed writes");

        Ok(results)
    }

    async fn reset(&self) -> StoreResult<()> {
        tracing::debug!(project = %self.project_id, "resetting store");
        *self.tree.write() = StoreTree::default();

        Ok(())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docmock_memory::InMemoryStore;
/// use docmock::backend::StoreBackendBuilder;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryStore::builder()
///         .seed(json!({ "users": { "alice": { "name": "Alice" } } }))
///         .build()
///         .await
///         .unwrap();
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStoreBuilder {
    project_id: Option<String>,
    seed: Option<Value>,
}

impl InMemoryStoreBuilder {
    /// Sets the project id reported by the store. Defaults to `"mock-project"`.
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Sets initial data in the form `{collection: {document_id: {fields}}}`.
    ///
    /// Collection keys may be nested collection paths such as `"users/alice/posts"`.
    pub fn seed(mut self, seed: Value) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds a store, loading the seed data if one was given.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Initialization`] if the seed is not shaped as nested
    /// objects or names an invalid path.
    async fn build(self) -> StoreResult<Self::Backend> {
        let project_id = self.project_id.as_deref().unwrap_or(DEFAULT_PROJECT_ID);
        let tree = match self.seed {
            Some(seed) => seed_tree(seed)?,
            None => StoreTree::default(),
        };

        Ok(InMemoryStore::with_tree(project_id, tree))
    }
}

fn seed_tree(seed: Value) -> StoreResult<StoreTree> {
    let Value::Object(collections) = seed else {
        return Err(StoreError::Initialization("seed data must be an object of collections".to_string()));
    };

    let now = Utc::now();
    let mut tree = StoreTree::default();
    let mut seeded = 0;

    for (name, documents) in collections {
        let Value::Object(documents) = documents else {
            return Err(StoreError::Initialization(format!("seed collection '{name}' must be an object of documents")));
        };

        tree.ensure_collection(&Path::collection(&name).map_err(initialization)?)
            .map_err(initialization)?;

        for (id, fields) in documents {
            let path = Path::document(&format!("{name}/{id}")).map_err(initialization)?;
            let write = Write {
                path,
                op: WriteOp::Set { data: seed_fields(&name, &id, &fields)?, options: SetOptions::Overwrite },
            };

            tree.apply(&write, now).map_err(initialization)?;
            seeded += 1;
        }
    }

    tracing::debug!(documents = seeded, "seeded store");

    Ok(tree)
}

fn seed_fields(collection: &str, id: &str, fields: &Value) -> StoreResult<Document> {
    match serialize_to_bson(fields)? {
        Bson::Document(document) => Ok(document),
        _ => Err(StoreError::Initialization(format!("seed document '{collection}/{id}' must be an object"))),
    }
}

fn initialization(error: StoreError) -> StoreError {
    StoreError::Initialization(error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docmock_core::{fields::FieldUpdates, query::{Filter, SortDirection}};
    use serde_json::json;

    fn write(path: &str, op: WriteOp) -> Write {
        Write { path: Path::parse(path), op }
    }

    fn set(path: &str, data: Document) -> Write {
        write(path, WriteOp::Set { data, options: SetOptions::Overwrite })
    }

    async fn cities() -> InMemoryStore {
        InMemoryStore::builder()
            .seed(json!({
                "cities": {
                    "SF": { "name": "San Francisco", "state": "CA", "population": 860000 },
                    "LA": { "name": "Los Angeles", "state": "CA", "population": 3900000 },
                    "DC": { "name": "Washington", "population": 680000 },
                    "TOK": { "name": "Tokyo", "country": "Japan" }
                }
            }))
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn clones_share_data() {
        let store = InMemoryStore::new();
        let other = store.clone();

        store.commit(vec![set("users/alice", doc! { "age": 30 })]).await.unwrap();

        let document = other.get_document(&Path::parse("users/alice")).await.unwrap().unwrap();
        assert_eq!(document.fields, doc! { "age": 30 });
    }

    #[tokio::test]
    async fn same_store_follows_shared_data() {
        let store = InMemoryStore::new();

        assert!(store.same_store(&store.clone()));
        assert!(!store.same_store(&InMemoryStore::new()));

        store.reset().await.unwrap();
        assert!(store.same_store(&store.clone()));
    }

    #[tokio::test]
    async fn get_document_returns_disconnected_copy() {
        let store = InMemoryStore::new();
        store.commit(vec![set("users/alice", doc! { "age": 30 })]).await.unwrap();

        let mut copy = store.get_document(&Path::parse("users/alice")).await.unwrap().unwrap();
        copy.fields.insert("age", 99);

        let fresh = store.get_document(&Path::parse("users/alice")).await.unwrap().unwrap();
        assert_eq!(fresh.fields, doc! { "age": 30 });
    }

    #[tokio::test]
    async fn commit_stops_at_first_failure() {
        let store = InMemoryStore::new();
        let update = write("users/bob", WriteOp::Update { updates: FieldUpdates::new().set("age", 1) });

        let result = store
            .commit(vec![
                set("users/alice", doc! { "age": 30 }),
                update,
                set("users/carol", doc! { "age": 40 }),
            ])
            .await;

        assert_eq!(result, Err(StoreError::DocumentNotFound("users/bob".to_string())));
        assert!(store.get_document(&Path::parse("users/alice")).await.unwrap().is_some());
        assert!(store.get_document(&Path::parse("users/carol")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_are_in_creation_order() {
        let store = InMemoryStore::new();
        store.create_collection(&Path::parse("zeta")).unwrap();
        store.create_collection(&Path::parse("alpha/doc/nested")).unwrap();
        store.commit(vec![set("zeta/b", doc! {}), set("zeta/a", doc! {})]).await.unwrap();

        assert_eq!(store.list_collections(None).await.unwrap(), ["zeta", "alpha"]);
        assert_eq!(store.list_collections(Some(&Path::parse("alpha/doc"))).await.unwrap(), ["nested"]);
        assert_eq!(store.list_documents(&Path::parse("zeta")).await.unwrap(), ["b", "a"]);
        assert_eq!(store.list_documents(&Path::parse("alpha")).await.unwrap(), ["doc"]);
        assert!(store.list_documents(&Path::parse("missing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn query_filters_sorts_and_pages() {
        let store = cities().await;
        let collection = Path::parse("cities");

        let query = Query::builder()
            .filter(Filter::eq("state", "CA"))
            .sort("population", SortDirection::Desc)
            .build();
        let ids = store
            .query_documents(&collection, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(ids, ["LA", "SF"]);

        let query = Query::builder()
            .sort("population", SortDirection::Asc)
            .offset(1)
            .limit(1)
            .build();
        let ids = store
            .query_documents(&collection, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(ids, ["SF"]);
    }

    #[tokio::test]
    async fn query_without_sort_keeps_insertion_order() {
        let store = cities().await;
        let results = store
            .query_documents(&Path::parse("cities"), &Query::new())
            .await
            .unwrap();

        let ids = results.into_iter().map(|(id, _)| id).collect::<Vec<_>>();
        assert_eq!(ids, ["SF", "LA", "DC", "TOK"]);
    }

    #[tokio::test]
    async fn builder_sets_project_and_seed() {
        let store = InMemoryStore::builder()
            .project_id("test-project")
            .seed(json!({ "users/alice/posts": { "p1": { "title": "Hello" } } }))
            .build()
            .await
            .unwrap();

        assert_eq!(store.project_id(), "test-project");
        assert_eq!(InMemoryStore::new().project_id(), DEFAULT_PROJECT_ID);

        let post = store.get_document(&Path::parse("users/alice/posts/p1")).await.unwrap().unwrap();
        assert_eq!(post.fields, doc! { "title": "Hello" });
        assert!(store.get_document(&Path::parse("users/alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn builder_rejects_malformed_seed() {
        for seed in [json!([1, 2]), json!({ "users": 1 }), json!({ "users": { "alice": 3 } }), json!({ "a/b": {} })] {
            let result = InMemoryStore::builder().seed(seed).build().await;
            assert!(matches!(result, Err(StoreError::Initialization(_))));
        }
    }

    #[tokio::test]
    async fn dump_skips_missing_documents_and_sub_collections() {
        let store = InMemoryStore::new();
        store
            .commit(vec![
                set("users/alice", doc! { "name": "Alice", "age": 30 }),
                set("users/bob/posts/p1", doc! { "title": "Hi" }),
            ])
            .await
            .unwrap();

        assert_eq!(
            store.dump().unwrap(),
            json!({ "users": { "alice": { "name": "Alice", "age": 30 } } })
        );
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let store = cities().await;
        store.reset().await.unwrap();

        assert!(store.list_collections(None).await.unwrap().is_empty());
        assert_eq!(store.dump().unwrap(), json!({}));
    }
}
