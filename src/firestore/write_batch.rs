//! Firestore WriteBatch type

use std::sync::Arc;

use super::document_reference::DocumentReference;
use super::field_path::{FieldPath, IntoFieldPath};
use super::field_value::{IntoMapValue, MapValue, Value};
use super::firestore::FirestoreInner;
use super::mutation::SetOptions;
use super::path::ResourcePath;
use crate::error::FirebaseError;

/// Write operations for batch writes and transactions
///
/// Represents the different writes the mutation engine can apply.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOperation {
    /// Create a document that must not exist yet
    Create {
        /// Document path
        path: ResourcePath,
        /// Document data
        data: MapValue,
    },
    /// Set a document, overwriting or merging per `options`
    Set {
        /// Document path
        path: ResourcePath,
        /// Document data
        data: MapValue,
        /// Merge behavior
        options: SetOptions,
    },
    /// Update specific fields in a document (keys are dotted field paths)
    Update {
        /// Document path
        path: ResourcePath,
        /// Fields to update
        data: MapValue,
    },
    /// Update specific fields, given as field path / value pairs
    UpdateFields {
        /// Document path
        path: ResourcePath,
        /// Pairs applied independently, in order
        fields: Vec<(FieldPath, Value)>,
    },
    /// Delete a document
    Delete {
        /// Document path to delete
        path: ResourcePath,
    },
}

impl WriteOperation {
    /// Path of the document this write targets
    pub fn path(&self) -> &ResourcePath {
        match self {
            WriteOperation::Create { path, .. }
            | WriteOperation::Set { path, .. }
            | WriteOperation::Update { path, .. }
            | WriteOperation::UpdateFields { path, .. }
            | WriteOperation::Delete { path } => path,
        }
    }

    pub(crate) fn set(
        document: &DocumentReference,
        data: impl IntoMapValue,
        options: SetOptions,
    ) -> Result<Self, FirebaseError> {
        Ok(WriteOperation::Set {
            path: document.resource_path().clone(),
            data: data.into_map_value()?,
            options,
        })
    }

    pub(crate) fn create(document: &DocumentReference, data: impl IntoMapValue) -> Result<Self, FirebaseError> {
        Ok(WriteOperation::Create {
            path: document.resource_path().clone(),
            data: data.into_map_value()?,
        })
    }

    pub(crate) fn update(document: &DocumentReference, data: impl IntoMapValue) -> Result<Self, FirebaseError> {
        Ok(WriteOperation::Update {
            path: document.resource_path().clone(),
            data: data.into_map_value()?,
        })
    }

    pub(crate) fn update_fields<I, P, V>(document: &DocumentReference, fields: I) -> Result<Self, FirebaseError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: IntoFieldPath,
        V: Into<Value>,
    {
        let fields = fields
            .into_iter()
            .map(|(field, value)| Ok((field.into_field_path()?, value.into())))
            .collect::<Result<Vec<_>, FirebaseError>>()?;
        Ok(WriteOperation::UpdateFields {
            path: document.resource_path().clone(),
            fields,
        })
    }

    pub(crate) fn delete(document: &DocumentReference) -> Self {
        WriteOperation::Delete {
            path: document.resource_path().clone(),
        }
    }
}

/// Write batch
///
/// Writes are queued by the builder methods and applied in order on
/// [`WriteBatch::commit`]. Argument errors (bad data shapes or field paths)
/// are reported by `commit`.
///
/// # Example
/// ```
/// use firestore_mock::firestore::Firestore;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
/// let db = Firestore::new();
/// let la = db.doc("cities/LA")?;
/// let sf = db.doc("cities/SF")?;
///
/// db.batch()
///     .set(&la, json!({ "name": "Los Angeles" }))
///     .set(&sf, json!({ "name": "San Francisco" }))
///     .update(&la, json!({ "population": 3900000 }))
///     .commit()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct WriteBatch {
    operations: Vec<Result<WriteOperation, FirebaseError>>,
    firestore: Arc<FirestoreInner>,
}

impl WriteBatch {
    pub(crate) fn new(firestore: Arc<FirestoreInner>) -> Self {
        Self {
            operations: Vec::new(),
            firestore,
        }
    }

    fn push(mut self, operation: Result<WriteOperation, FirebaseError>) -> Self {
        self.operations.push(operation);
        self
    }

    /// Create a document (fails on commit if it already exists)
    pub fn create(self, document: &DocumentReference, data: impl IntoMapValue) -> Self {
        self.push(WriteOperation::create(document, data))
    }

    /// Set document data (overwrites existing document)
    pub fn set(self, document: &DocumentReference, data: impl IntoMapValue) -> Self {
        self.push(WriteOperation::set(document, data, SetOptions::default()))
    }

    /// Set document data with merge options
    pub fn set_with_options(self, document: &DocumentReference, data: impl IntoMapValue, options: SetOptions) -> Self {
        self.push(WriteOperation::set(document, data, options))
    }

    /// Update document fields (document must exist)
    pub fn update(self, document: &DocumentReference, data: impl IntoMapValue) -> Self {
        self.push(WriteOperation::update(document, data))
    }

    /// Update document fields from field path / value pairs
    pub fn update_fields<I, P, V>(self, document: &DocumentReference, fields: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        P: IntoFieldPath,
        V: Into<Value>,
    {
        self.push(WriteOperation::update_fields(document, fields))
    }

    /// Delete document
    pub fn delete(self, document: &DocumentReference) -> Self {
        self.push(Ok(WriteOperation::delete(document)))
    }

    /// Commit the batch
    ///
    /// Writes apply in the order they were added. The first failing write
    /// stops the commit and is returned; writes before it stay applied.
    /// Committing an empty batch succeeds.
    pub async fn commit(self) -> Result<(), FirebaseError> {
        let operations = self.operations.into_iter().collect::<Result<Vec<_>, _>>()?;
        self.firestore.commit(operations).await?;
        Ok(())
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Get number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }
}

impl std::fmt::Debug for WriteBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteBatch")
            .field("operations", &self.operations.len())
            .finish()
    }
}
