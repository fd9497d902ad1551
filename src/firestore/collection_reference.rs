//! Firestore CollectionReference type

use std::sync::Arc;

use tracing::debug;

use super::document_reference::DocumentReference;
use super::field_value::IntoMapValue;
use super::firestore::FirestoreInner;
use super::path::{validate_id, ResourcePath};
use super::query::{Query, QueryState, QueryTarget};
use crate::error::FirebaseError;

/// Reference to a Firestore collection
///
/// Implements the Query trait to support filtering, ordering, and pagination.
/// Query methods return new values; the reference itself never changes.
///
/// # Example
/// ```
/// use firestore_mock::firestore::{Firestore, Query};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
/// let db = Firestore::new();
/// let users = db.collection("users")?;
///
/// let alice = users.add(json!({ "name": "Alice" })).await?;
/// assert_eq!(alice.id().len(), 20);
///
/// let docs = users.list_documents().await?;
/// assert_eq!(docs, vec![alice]);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CollectionReference {
    path: ResourcePath,
    /// Internal query state
    pub(crate) state: QueryState,
}

impl CollectionReference {
    pub(crate) fn new(path: ResourcePath, firestore: Arc<FirestoreInner>) -> Self {
        Self {
            state: QueryState::new(QueryTarget::Collection(path.clone()), firestore),
            path,
        }
    }

    /// Get collection ID (last segment of path)
    pub fn id(&self) -> &str {
        self.path.last_segment()
    }

    /// Slash-separated path relative to the database root
    pub fn path(&self) -> String {
        self.path.canonical_string()
    }

    /// Parsed path
    pub fn resource_path(&self) -> &ResourcePath {
        &self.path
    }

    /// Document owning this collection; `None` for top-level collections
    pub fn parent(&self) -> Option<DocumentReference> {
        self.path
            .parent()
            .map(|parent| DocumentReference::new(parent, Arc::clone(&self.state.firestore)))
    }

    /// Get a document reference within this collection
    pub fn doc(&self, document_id: &str) -> Result<DocumentReference, FirebaseError> {
        validate_id(document_id)?;
        Ok(DocumentReference::new(
            self.path.appended(document_id),
            Arc::clone(&self.state.firestore),
        ))
    }

    /// Reference to a new document with an auto-generated id
    pub fn doc_auto(&self) -> DocumentReference {
        let id = self.state.firestore.auto_id();
        DocumentReference::new(self.path.appended(&id), Arc::clone(&self.state.firestore))
    }

    /// Add a new document with auto-generated ID
    pub async fn add(&self, data: impl IntoMapValue) -> Result<DocumentReference, FirebaseError> {
        let document = self.doc_auto();
        document.create(data).await?;
        debug!(collection = %self.path, document = document.id(), "Added document");
        Ok(document)
    }

    /// References to every existing document, in insertion order
    pub async fn list_documents(&self) -> Result<Vec<DocumentReference>, FirebaseError> {
        let store = self.state.firestore.store.read().await;
        let documents = store
            .collection(&self.path)
            .map(|collection| {
                collection
                    .existing_documents()
                    .map(|doc| {
                        DocumentReference::new(self.path.appended(&doc.id), Arc::clone(&self.state.firestore))
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(documents)
    }
}

impl Query for CollectionReference {
    fn query_state(&self) -> &QueryState {
        &self.state
    }

    fn with_state(&self, state: QueryState) -> Self {
        Self {
            path: self.path.clone(),
            state,
        }
    }
}

impl std::fmt::Debug for CollectionReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionReference")
            .field("path", &self.path.canonical_string())
            .field("filters", &self.state.filters)
            .finish()
    }
}
