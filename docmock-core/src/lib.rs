//! Core of docmock, an in-memory stand-in for a hierarchical document database.
//!
//! Test code talks to the store through the same shapes a networked client offers:
//! collections and documents addressed by slash-delimited paths, snapshots, batched
//! writes and transactions. This crate provides:
//!
//! - **Paths** ([`path`]) - Parsing and arity validation of collection/document paths
//! - **Field updates** ([`fields`]) - Dotted field paths, deep merge and field transforms
//! - **Documents** ([`document`]) - Stored documents and typed conversion helpers
//! - **Store backend abstraction** ([`backend`]) - The trait storage implementations provide
//! - **References** ([`reference`]) - Document and collection handles
//! - **Client** ([`client`]) - Entry point handing out references, batches and transactions
//! - **Batches** ([`batch`]) and **transactions** ([`transaction`]) - Queued writes replayed on commit
//! - **Writes** ([`write`]) - Write records and the [`write::WriteTarget`] capability
//! - **Snapshots** ([`snapshot`]) - Disconnected point-in-time document copies
//! - **Queries** ([`query`]) - Filter, order and paging of collection reads
//! - **Streams** ([`stream`]) - Lazily evaluated async enumeration
//! - **Error handling** ([`error`]) - Error types and result types
//!
//! # Example
//!
//! ```ignore
//! use docmock::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let client = Client::new(InMemoryStore::new());
//! let cities = client.collection("cities")?;
//!
//! let mut batch = client.batch();
//! batch.set(&cities.document("SF")?, doc! { "name": "San Francisco" });
//! batch.set(&cities.document("LA")?, doc! { "name": "Los Angeles" });
//! batch.commit().await?;
//!
//! assert!(cities.document("SF")?.get().await?.exists());
//! ```

#[allow(unused_extern_crates)]
extern crate self as docmock_core;

pub mod backend;
pub mod batch;
pub mod client;
pub mod document;
pub mod error;
pub mod fields;
pub mod path;
pub mod query;
pub mod reference;
pub mod snapshot;
pub mod stream;
pub mod transaction;
pub mod write;
