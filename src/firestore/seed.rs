//! Seed description of a database
//!
//! The literal form maps each top-level collection name to a list of
//! documents; every document may nest further collections one level deeper:
//!
//! ```json
//! {
//!   "users": [
//!     { "id": "alice", "data": { "age": 30 },
//!       "subcollections": { "posts": [ { "id": "p1", "data": { "title": "hi" } } ] } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::field_value::{MapValue, Value};
use super::mutation::validate_data;
use super::path::{validate_id, ResourcePath};
use super::store::Store;
use crate::error::{FirebaseError, FirestoreError};

/// Initial contents of a database
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Seed {
    collections: BTreeMap<String, Vec<SeedDocument>>,
}

/// One seeded document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedDocument {
    /// Document id within its collection
    pub id: String,

    /// Document fields
    #[serde(default)]
    pub data: MapValue,

    /// Nested collections keyed by name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subcollections: BTreeMap<String, Vec<SeedDocument>>,
}

impl Seed {
    /// An empty seed
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON literal form
    pub fn from_json(json: &str) -> Result<Self, FirebaseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convert an already-parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, FirebaseError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Add (or extend) a top-level collection
    pub fn collection(
        mut self,
        name: impl Into<String>,
        documents: impl IntoIterator<Item = SeedDocument>,
    ) -> Self {
        self.collections
            .entry(name.into())
            .or_default()
            .extend(documents);
        self
    }

    /// Top-level collection names
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Builds the store, validating every id and all document data
    pub(crate) fn into_store(self) -> Result<Store, FirestoreError> {
        let mut store = Store::new();
        let mut pending: Vec<(ResourcePath, Vec<SeedDocument>)> = Vec::new();

        for (name, documents) in self.collections {
            validate_id(&name)?;
            pending.push((ResourcePath::from_segments(vec![name]), documents));
        }

        let mut count = 0usize;
        while let Some((collection_path, documents)) = pending.pop() {
            store.create_path(&collection_path, None)?;
            for document in documents {
                validate_id(&document.id)?;
                validate_data(&document.data)?;
                if document.data.iter().any(|(_, value)| contains_sentinel(value)) {
                    return Err(FirestoreError::invalid_argument(format!(
                        "Seed document '{}/{}' contains a field value sentinel",
                        collection_path, document.id
                    )));
                }

                let document_path = collection_path.child(&document.id)?;
                store.add_document(&collection_path, &document.id, document.data.normalized())?;
                count += 1;

                for (name, children) in document.subcollections {
                    pending.push((document_path.child(&name)?, children));
                }
            }
        }

        debug!(documents = count, "Built store from seed");
        Ok(store)
    }
}

fn contains_sentinel(value: &Value) -> bool {
    match value {
        Value::Sentinel(_) => true,
        Value::Array(items) => items.iter().any(contains_sentinel),
        Value::Map(map) => map.iter().any(|(_, nested)| contains_sentinel(nested)),
        _ => false,
    }
}

impl SeedDocument {
    /// A document with `data` and no subcollections
    pub fn new(id: impl Into<String>, data: impl Into<MapValue>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
            subcollections: BTreeMap::new(),
        }
    }

    /// Add (or extend) a nested collection
    pub fn subcollection(
        mut self,
        name: impl Into<String>,
        documents: impl IntoIterator<Item = SeedDocument>,
    ) -> Self {
        self.subcollections
            .entry(name.into())
            .or_default()
            .extend(documents);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_seed_from_json() {
        let seed = Seed::from_value(json!({
            "users": [
                { "id": "alice", "data": { "age": 30 },
                  "subcollections": { "posts": [ { "id": "p1", "data": { "title": "hi" } } ] } },
                { "id": "bob" }
            ]
        }))
        .unwrap();
        let store = seed.into_store().unwrap();

        let alice = ResourcePath::document("users/alice").unwrap();
        assert_eq!(store.document(&alice).unwrap().get("age").and_then(|v| v.as_i64()), Some(30));
        let bob = ResourcePath::document("users/bob").unwrap();
        assert_eq!(store.document(&bob), Some(&MapValue::new()));
        let post = ResourcePath::document("users/alice/posts/p1").unwrap();
        assert!(store.document(&post).is_some());
    }

    #[test]
    fn test_seed_builder() {
        let seed = Seed::new().collection(
            "animals",
            [
                SeedDocument::new("monkey", MapValue::new().with("legCount", 2)),
                SeedDocument::new("elephant", MapValue::new().with("legCount", 4))
                    .subcollection("calves", [SeedDocument::new("c1", MapValue::new())]),
            ],
        );
        assert_eq!(seed.collection_names().collect::<Vec<_>>(), ["animals"]);

        let store = seed.into_store().unwrap();
        let animals = ResourcePath::collection("animals").unwrap();
        let ids: Vec<_> = store
            .collection(&animals)
            .unwrap()
            .documents
            .iter()
            .map(|doc| doc.id.clone())
            .collect();
        assert_eq!(ids, ["monkey", "elephant"]);
    }

    #[test]
    fn test_seed_rejects_bad_ids() {
        let seed = Seed::new().collection("users", [SeedDocument::new("a/b", MapValue::new())]);
        assert!(matches!(seed.into_store(), Err(FirestoreError::InvalidPath(_))));

        let seed = Seed::new().collection("", [SeedDocument::new("a", MapValue::new())]);
        assert!(seed.into_store().is_err());
    }

    #[test]
    fn test_seed_duplicate_ids_keep_last() {
        let seed = Seed::new().collection(
            "c",
            [
                SeedDocument::new("x", MapValue::new().with("v", 1)),
                SeedDocument::new("x", MapValue::new().with("v", 2)),
            ],
        );
        let store = seed.into_store().unwrap();
        let x = ResourcePath::document("c/x").unwrap();
        assert_eq!(store.document(&x).unwrap().get("v").and_then(|v| v.as_i64()), Some(2));
    }

    #[test]
    fn test_seed_invalid_json() {
        assert!(matches!(
            Seed::from_json("{ not json"),
            Err(FirebaseError::Serialization(_))
        ));
    }
}
