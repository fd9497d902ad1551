//! Read-only view of a single document

use serde::de::DeserializeOwned;

use super::document_reference::DocumentReference;
use super::field_path::FieldPath;
use super::field_value::{MapValue, Value};
use crate::error::FirebaseError;

/// Firestore document snapshot
///
/// Holds its own copy of the data taken at read time; later writes to the
/// store do not show through.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    reference: DocumentReference,
    data: Option<MapValue>,
}

impl DocumentSnapshot {
    pub(crate) fn new(reference: DocumentReference, data: Option<MapValue>) -> Self {
        Self { reference, data }
    }

    /// Check if document exists
    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    /// Get document ID
    pub fn id(&self) -> &str {
        self.reference.id()
    }

    /// Reference to the document this snapshot was read from
    pub fn reference(&self) -> &DocumentReference {
        &self.reference
    }

    /// Copy of the document data, `None` when it does not exist
    ///
    /// Mutating the returned map never affects the snapshot or the store.
    pub fn data(&self) -> Option<MapValue> {
        self.data.clone()
    }

    /// Get a field value by dotted path (`"address.city"`)
    pub fn get(&self, field: &str) -> Option<&Value> {
        let path = FieldPath::from_dot_separated(field).ok()?;
        self.get_path(&path)
    }

    /// Get a field value by [`FieldPath`]
    pub fn get_path(&self, field: &FieldPath) -> Option<&Value> {
        self.data.as_ref()?.get_path(field)
    }

    /// JSON rendering of the data (`null` when missing)
    pub fn to_json(&self) -> serde_json::Value {
        match &self.data {
            Some(data) => serde_json::Value::Object(data.to_json_object()),
            None => serde_json::Value::Null,
        }
    }

    /// Deserialize the data into `T`; `Ok(None)` when the document is missing
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<Option<T>, FirebaseError> {
        if !self.exists() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(self.to_json())?))
    }
}
