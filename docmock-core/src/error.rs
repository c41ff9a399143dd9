//! Error types and result types for mock store operations.
//!
//! Every fallible operation in this crate returns a [`StoreResult<T>`]. Errors are
//! reported to the caller of the operation that detected them and are never retried.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with the mock store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A collection was requested at a path with an even number of segments.
    #[error("Cannot open collection at path {0}: expected an odd number of segments")]
    InvalidCollectionPath(String),
    /// A document was requested at a path with an odd (or zero) number of segments.
    #[error("Cannot open document at path {0}: expected an even number of segments")]
    InvalidDocumentPath(String),
    /// An update targeted a document that does not exist.
    #[error("No document to update: {0}")]
    DocumentNotFound(String),
    /// A create targeted a document that already exists.
    #[error("Document already exists: {0}")]
    DocumentAlreadyExists(String),
    /// An argument was rejected, e.g. a malformed field path or an empty update.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization, such as malformed seed data.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// A specialized `Result` type for mock store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<BsonError> for StoreError {
    fn from(err: BsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for StoreError {
    fn from(err: SerdeJsonError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
