//! Field paths and field-level mutations.
//!
//! Field paths address values nested inside a document using `.` as separator
//! (`"address.city"`). [`FieldUpdates`] collects the partial updates accepted by
//! `update()`, including server-side transforms such as increments and array unions.

use bson::{Bson, Document};
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};

/// A parsed, dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a dotted field path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if the path is empty or contains an
    /// empty segment (`"a..b"`, `".a"`).
    pub fn parse(path: &str) -> StoreResult<Self> {
        let segments = path
            .split('.')
            .map(str::to_string)
            .collect::<Vec<_>>();

        if segments.iter().any(String::is_empty) {
            return Err(StoreError::InvalidArgument(format!("invalid field path '{path}'")));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Looks up the value at this path.
    pub fn get<'a>(&self, document: &'a Document) -> Option<&'a Bson> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = document;

        for segment in parents {
            current = current.get(segment)?.as_document()?;
        }

        current.get(last)
    }

    /// Writes `value` at this path, replacing any non-map value found on the way.
    pub fn set(&self, document: &mut Document, value: Bson) {
        let Some((last, parents)) = self.segments.split_last() else {
            return;
        };
        let mut current = document;

        for segment in parents {
            let slot = current
                .entry(segment.clone())
                .or_insert_with(|| Bson::Document(Document::new()));

            if slot.as_document().is_none() {
                *slot = Bson::Document(Document::new());
            }

            let Some(nested) = slot.as_document_mut() else {
                return;
            };
            current = nested;
        }

        current.insert(last.clone(), value);
    }

    /// Removes the value at this path, returning it if it was present.
    pub fn remove(&self, document: &mut Document) -> Option<Bson> {
        let (last, parents) = self.segments.split_last()?;
        let mut current = document;

        for segment in parents {
            current = current.get_mut(segment)?.as_document_mut()?;
        }

        current.remove(last)
    }
}

/// Deep-merges `source` into `target`.
///
/// Nested maps present on both sides are merged key by key; every other value in
/// `source` replaces the value in `target`.
pub fn merge_documents(target: &mut Document, source: Document) {
    for (key, value) in source {
        match value {
            Bson::Document(incoming) => {
                if let Some(Bson::Document(existing)) = target.get_mut(&key) {
                    merge_documents(existing, incoming);
                    continue;
                }

                target.insert(key, incoming);
            }
            value => {
                target.insert(key, value);
            }
        }
    }
}

/// A single field-level mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Writes the value.
    Set(Bson),
    /// Removes the field.
    Delete,
    /// Writes the commit timestamp.
    ServerTimestamp,
    /// Adds a number to the current value, or writes it if the field is not numeric.
    Increment(Bson),
    /// Appends each element not already present in the array.
    ArrayUnion(Vec<Bson>),
    /// Removes every occurrence of each element from the array.
    ArrayRemove(Vec<Bson>),
}

/// An ordered list of field mutations applied by `update()`.
///
/// Plain documents convert into updates that set each top-level key, and keys may be
/// dotted field paths:
///
/// ```ignore
/// doc_ref.update(doc! { "profile.name": "Alice" }).await?;
///
/// doc_ref.update(
///     FieldUpdates::new()
///         .increment("visits", 1)
///         .array_union("tags", ["new"])
///         .delete("legacy"),
/// ).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdates {
    entries: Vec<(String, FieldValue)>,
}

impl FieldUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a raw mutation.
    pub fn push(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.entries.push((field.into(), value));
        self
    }

    pub fn set(self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.push(field, FieldValue::Set(value.into()))
    }

    pub fn delete(self, field: impl Into<String>) -> Self {
        self.push(field, FieldValue::Delete)
    }

    pub fn server_timestamp(self, field: impl Into<String>) -> Self {
        self.push(field, FieldValue::ServerTimestamp)
    }

    pub fn increment(self, field: impl Into<String>, by: impl Into<Bson>) -> Self {
        self.push(field, FieldValue::Increment(by.into()))
    }

    pub fn array_union<V: Into<Bson>>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.push(field, FieldValue::ArrayUnion(values.into_iter().map(Into::into).collect()))
    }

    pub fn array_remove<V: Into<Bson>>(self, field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        self.push(field, FieldValue::ArrayRemove(values.into_iter().map(Into::into).collect()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries
            .iter()
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Applies every mutation to `document` in order.
    ///
    /// All field paths are validated before anything is written, so a malformed path
    /// leaves `document` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if there are no mutations or a field path
    /// is malformed.
    pub fn apply(&self, document: &mut Document, now: DateTime<Utc>) -> StoreResult<()> {
        if self.entries.is_empty() {
            return Err(StoreError::InvalidArgument("update requires at least one field".to_string()));
        }

        let parsed = self.entries
            .iter()
            .map(|(field, value)| Ok((FieldPath::parse(field)?, value)))
            .collect::<StoreResult<Vec<_>>>()?;

        for (path, value) in parsed {
            match value {
                FieldValue::Set(value) => path.set(document, value.clone()),
                FieldValue::Delete => {
                    path.remove(document);
                }
                FieldValue::ServerTimestamp => {
                    path.set(document, Bson::DateTime(bson::DateTime::from_chrono(now)))
                }
                FieldValue::Increment(by) => {
                    let next = increment(path.get(document), by);
                    path.set(document, next);
                }
                FieldValue::ArrayUnion(values) => {
                    let mut array = current_array(path.get(document));
                    for value in values {
                        if !array.contains(value) {
                            array.push(value.clone());
                        }
                    }
                    path.set(document, Bson::Array(array));
                }
                FieldValue::ArrayRemove(values) => {
                    let mut array = current_array(path.get(document));
                    array.retain(|item| !values.contains(item));
                    path.set(document, Bson::Array(array));
                }
            }
        }

        Ok(())
    }
}

impl From<Document> for FieldUpdates {
    fn from(document: Document) -> Self {
        Self {
            entries: document
                .into_iter()
                .map(|(field, value)| (field, FieldValue::Set(value)))
                .collect(),
        }
    }
}

fn current_array(value: Option<&Bson>) -> Vec<Bson> {
    match value {
        Some(Bson::Array(array)) => array.clone(),
        _ => Vec::new(),
    }
}

fn increment(current: Option<&Bson>, by: &Bson) -> Bson {
    match (current, by) {
        (Some(Bson::Int32(a)), Bson::Int32(b)) => a
            .checked_add(*b)
            .map(Bson::Int32)
            .unwrap_or_else(|| Bson::Int64(i64::from(*a) + i64::from(*b))),
        (Some(Bson::Int32(a)), Bson::Int64(b)) => Bson::Int64(i64::from(*a).wrapping_add(*b)),
        (Some(Bson::Int64(a)), Bson::Int32(b)) => Bson::Int64(a.wrapping_add(i64::from(*b))),
        (Some(Bson::Int64(a)), Bson::Int64(b)) => Bson::Int64(a.wrapping_add(*b)),
        (Some(current), by) => match (as_f64(current), as_f64(by)) {
            (Some(a), Some(b)) => Bson::Double(a + b),
            _ => by.clone(),
        },
        (None, by) => by.clone(),
    }
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(f64::from(*value)),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}
