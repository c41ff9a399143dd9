//! Slash-delimited resource paths.
//!
//! A path is a sequence of non-empty segments alternating between collection ids and
//! document ids, starting with a collection. The segment count decides what a path
//! addresses: odd counts name collections, even (non-zero) counts name documents.
//!
//! ```ignore
//! use docmock::path::Path;
//!
//! let users = Path::collection("users")?;
//! let alice = users.child("alice");
//! assert!(alice.is_document());
//! assert_eq!(alice.to_string(), "users/alice");
//!
//! assert!(Path::collection("users/alice").is_err());
//! ```

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// An ordered sequence of path segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Splits `path` on `/`, dropping empty segments. No arity check is performed.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path
                .split('/')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Parses a collection path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCollectionPath`] if the segment count is even.
    pub fn collection(path: &str) -> StoreResult<Self> {
        let parsed = Self::parse(path);

        if !parsed.is_collection() {
            return Err(StoreError::InvalidCollectionPath(path.to_string()));
        }

        Ok(parsed)
    }

    /// Parses a document path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDocumentPath`] if the segment count is odd or zero.
    pub fn document(path: &str) -> StoreResult<Self> {
        let parsed = Self::parse(path);

        if !parsed.is_document() {
            return Err(StoreError::InvalidDocumentPath(path.to_string()));
        }

        Ok(parsed)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `true` if this path addresses a collection.
    pub fn is_collection(&self) -> bool {
        self.segments.len() % 2 == 1
    }

    /// Returns `true` if this path addresses a document.
    pub fn is_document(&self) -> bool {
        !self.segments.is_empty() && self.segments.len() % 2 == 0
    }

    /// Returns the last segment, or an empty string for the root path.
    pub fn id(&self) -> &str {
        self.segments
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Returns the path with the last segment removed, or `None` for the root path.
    pub fn parent(&self) -> Option<Path> {
        let (_, parents) = self.segments.split_last()?;

        Some(Self { segments: parents.to_vec() })
    }

    /// Appends a single segment.
    pub fn child(&self, segment: impl Into<String>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment.into());

        Self { segments }
    }

    /// Appends every segment of `other`.
    pub fn join(&self, other: &Path) -> Path {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());

        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
