//! In-memory document tree backend for docmock.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! Collections and documents live in a nested tree guarded by a read-write lock, so every
//! clone of a store observes the same data.
//!
//! # Features
//!
//! - **Nested collections** - Documents host sub-collections to any depth
//! - **Ordered enumeration** - Collections and documents are listed in creation order
//! - **Query support** - Filtering on dotted field paths, multi-field sorting and paging
//! - **Seed data** - Stores can be built pre-populated from JSON
//!
//! # Quick Start
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().project_id("demo").build().await?;
//!     let client = Client::new(backend);
//!
//!     let alice = client.document("users/alice")?;
//!     alice.set(doc! { "name": "Alice" }).await?;
//!
//!     assert!(alice.get().await?.exists());
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmock_memory;

mod tree;

pub mod store;
mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
