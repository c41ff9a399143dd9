//! Convenient re-exports of commonly used types from docmock.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docmock::prelude::*;
//! ```
//!
//! This provides access to:
//! - The client, references and snapshots
//! - Batches, transactions and write records
//! - Field updates and merge options
//! - Query construction and filtering
//! - Store backends, builders and error types

pub use docmock_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    batch::WriteBatch,
    client::Client,
    document::{DocumentData, StoredDocument},
    error::{StoreError, StoreResult},
    fields::{FieldPath, FieldUpdates, FieldValue},
    path::Path,
    query::{Expr, FieldOp, Filter, Query, QueryBuilder, QueryVisitor, Sort, SortDirection},
    reference::{CollectionReference, DocumentReference},
    snapshot::DocumentSnapshot,
    transaction::Transaction,
    write::{SetOptions, Write, WriteOp, WriteResult, WriteTarget},
};
