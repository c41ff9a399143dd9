//! Main docmock crate: an in-memory mock of a hierarchical document database.
//!
//! This crate is the primary entry point for users of docmock. It re-exports the core
//! types from `docmock-core` and the in-memory backend from `docmock-memory`.
//!
//! # Features
//!
//! - **Path addressing** - Collections and documents addressed by slash-delimited paths
//! - **Nested data** - Documents host sub-collections to any depth
//! - **Batches and transactions** - Queued writes replayed in order on commit
//! - **Async enumeration** - Collections, documents and query results as streams
//! - **Seeded stores** - Build a store pre-populated from JSON for test fixtures
//!
//! # Quick Start
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use docmock::futures::TryStreamExt;
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(InMemoryStore::new());
//!
//!     // Queue writes and apply them together
//!     let mut batch = client.batch();
//!     batch.set(&client.document("foo/first")?, doc! { "id": 1 });
//!     batch.set(&client.document("foo/second")?, doc! { "id": 2 });
//!     batch.commit().await?;
//!
//!     // Enumerate the collection
//!     let snapshots = client
//!         .collection("foo")?
//!         .stream()
//!         .try_collect::<Vec<_>>()
//!         .await?;
//!     assert_eq!(snapshots.len(), 2);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Queries
//!
//! ```ignore
//! use docmock::prelude::*;
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("state", "CA"))
//!     .sort("population", SortDirection::Desc)
//!     .limit(2)
//!     .build();
//!
//! let largest = cities.query(query).try_collect::<Vec<_>>().await?;
//! ```
//!
//! # Generic Writers
//!
//! The client, batches and transactions all implement [`write::WriteTarget`], so helpers
//! can be written once and used either to apply writes immediately or to queue them.
//!
//! ```ignore
//! use docmock::prelude::*;
//!
//! async fn register<B: StoreBackend>(
//!     target: &mut impl WriteTarget<B>,
//!     user: &DocumentReference<B>,
//! ) -> StoreResult<()> {
//!     target.submit(Write::set(user, doc! { "active": true })).await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - The in-memory document tree

pub mod prelude;

pub use docmock_core::{
    backend, batch, client, document, error, fields, path, query, reference, snapshot, stream,
    transaction, write,
};

// Re-export BSON and stream types for convenience
pub use bson;
pub use futures;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docmock_memory::{InMemoryStore, InMemoryStoreBuilder};
}
