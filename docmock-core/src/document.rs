//! Stored document representation and typed conversion helpers.
//!
//! Documents are held as ordered [`bson::Document`] field maps. [`DocumentData`] lets
//! any serde type be written to and read back from a document.

use bson::{Bson, Document, de::deserialize_from_bson, ser::serialize_to_bson};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{StoreError, StoreResult},
    fields::{FieldPath, FieldUpdates, merge_documents},
    write::SetOptions,
};

/// The fields of an existing document together with its write timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub fields: Document,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl StoredDocument {
    /// Creates a document written at `now`.
    pub fn new(fields: Document, now: DateTime<Utc>) -> Self {
        Self {
            fields,
            create_time: now,
            update_time: now,
        }
    }

    /// Computes the result of a `set` against the current document (if any).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidArgument`] if a merge field path is malformed or
    /// missing from `data`.
    pub fn apply_set(
        existing: Option<&StoredDocument>,
        data: &Document,
        options: &SetOptions,
        now: DateTime<Utc>,
    ) -> StoreResult<StoredDocument> {
        let create_time = existing
            .map(|document| document.create_time)
            .unwrap_or(now);
        let current = existing
            .map(|document| document.fields.clone())
            .unwrap_or_default();

        let fields = match options {
            SetOptions::Overwrite => data.clone(),
            SetOptions::Merge => {
                let mut fields = current;
                merge_documents(&mut fields, data.clone());
                fields
            }
            SetOptions::MergeFields(paths) => {
                let mut fields = current;

                for path in paths {
                    let field_path = FieldPath::parse(path)?;
                    let value = field_path
                        .get(data)
                        .ok_or_else(|| StoreError::InvalidArgument(
                            format!("merge field '{path}' is not present in the document data")
                        ))?;

                    field_path.set(&mut fields, value.clone());
                }

                fields
            }
        };

        Ok(Self {
            fields,
            create_time,
            update_time: now,
        })
    }

    /// Applies a partial update in place.
    ///
    /// # Errors
    ///
    /// See [`FieldUpdates::apply`].
    pub fn apply_update(&mut self, updates: &FieldUpdates, now: DateTime<Utc>) -> StoreResult<()> {
        updates.apply(&mut self.fields, now)?;
        self.update_time = now;

        Ok(())
    }
}

/// Conversion between serde types and document field maps.
///
/// This trait is automatically implemented for every type that is `Serialize` and
/// `DeserializeOwned`.
///
/// ```ignore
/// #[derive(Serialize, Deserialize)]
/// struct City { name: String, population: i64 }
///
/// let fields = City { name: "Oslo".into(), population: 709_000 }.to_fields()?;
/// let city = City::from_fields(fields)?;
/// ```
pub trait DocumentData: Sized {
    /// Serializes this value into a document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails or the value is not a map.
    fn to_fields(&self) -> StoreResult<Document>;

    /// Deserializes a value from a document.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_fields(fields: Document) -> StoreResult<Self>;
}

impl<T: Serialize + DeserializeOwned> DocumentData for T {
    fn to_fields(&self) -> StoreResult<Document> {
        match serialize_to_bson(self)? {
            Bson::Document(fields) => Ok(fields),
            other => Err(StoreError::Serialization(
                format!("expected a map-like value, got {:?}", other.element_type())
            )),
        }
    }

    fn from_fields(fields: Document) -> StoreResult<Self> {
        Ok(deserialize_from_bson(Bson::Document(fields))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct City {
        name: String,
        population: i64,
    }

    #[test]
    fn overwrite_replaces_fields_and_keeps_create_time() {
        let created = Utc::now();
        let existing = StoredDocument::new(doc! { "a": 1, "b": 2 }, created);
        let later = created + chrono::Duration::seconds(5);

        let next = StoredDocument::apply_set(Some(&existing), &doc! { "c": 3 }, &SetOptions::Overwrite, later).unwrap();

        assert_eq!(next.fields, doc! { "c": 3 });
        assert_eq!(next.create_time, created);
        assert_eq!(next.update_time, later);
    }

    #[test]
    fn merge_fields_copies_only_listed_paths() {
        let now = Utc::now();
        let existing = StoredDocument::new(doc! { "a": 1, "nested": { "x": 1 } }, now);
        let data = doc! { "a": 10, "nested": { "x": 5, "y": 6 } };

        let next = StoredDocument::apply_set(
            Some(&existing),
            &data,
            &SetOptions::merge_fields(["nested.y"]),
            now,
        ).unwrap();

        assert_eq!(next.fields, doc! { "a": 1, "nested": { "x": 1, "y": 6 } });
    }

    #[test]
    fn merge_fields_requires_present_paths() {
        let result = StoredDocument::apply_set(None, &doc! { "a": 1 }, &SetOptions::merge_fields(["b"]), Utc::now());
        assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn typed_round_trip() {
        let city = City { name: "Oslo".to_string(), population: 709_000 };
        let fields = city.to_fields().unwrap();

        assert_eq!(fields, doc! { "name": "Oslo", "population": 709_000_i64 });
        assert_eq!(City::from_fields(fields).unwrap(), city);
    }

    #[test]
    fn non_map_values_are_rejected() {
        assert!(matches!(42_i32.to_fields(), Err(StoreError::Serialization(_))));
    }
}
