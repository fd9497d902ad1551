//! Firestore DocumentReference type

use std::sync::Arc;

use tracing::trace;

use super::collection_reference::CollectionReference;
use super::document_snapshot::DocumentSnapshot;
use super::field_path::IntoFieldPath;
use super::field_value::{IntoMapValue, Value};
use super::firestore::FirestoreInner;
use super::mutation::SetOptions;
use super::path::ResourcePath;
use super::store::Node;
use super::write_batch::WriteOperation;
use crate::error::FirebaseError;

/// Reference to a Firestore document
///
/// Cheap to clone; every clone addresses the same in-memory database.
///
/// # Example
/// ```
/// use firestore_mock::firestore::{Firestore, SetOptions};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
/// let db = Firestore::new();
/// let alice = db.doc("users/alice")?;
///
/// alice.set(json!({ "name": "Alice" })).await?;
/// alice.set_with_options(json!({ "age": 30 }), SetOptions::merge()).await?;
///
/// let snapshot = alice.get().await?;
/// assert_eq!(snapshot.to_json(), json!({ "name": "Alice", "age": 30 }));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DocumentReference {
    path: ResourcePath,
    firestore: Arc<FirestoreInner>,
}

impl DocumentReference {
    pub(crate) fn new(path: ResourcePath, firestore: Arc<FirestoreInner>) -> Self {
        Self { path, firestore }
    }

    /// Get the document ID (last segment of path)
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

    /// Collection containing this document
    pub fn parent(&self) -> CollectionReference {
        let parent = self
            .path
            .parent()
            .unwrap_or_else(|| ResourcePath::from_segments(Vec::new()));
        CollectionReference::new(parent, Arc::clone(&self.firestore))
    }

    /// Subcollection `collection_path` (may itself be a longer relative path)
    pub fn collection(&self, collection_path: &str) -> Result<CollectionReference, FirebaseError> {
        let relative = ResourcePath::parse(collection_path, None)?;
        let mut segments = self.path.segments().to_vec();
        segments.extend(relative.segments().iter().cloned());
        let path = ResourcePath::from_segments(segments);
        let path = ResourcePath::collection(&path.canonical_string())?;
        Ok(CollectionReference::new(path, Arc::clone(&self.firestore)))
    }

    /// Subcollections of this document, in name order
    ///
    /// Subcollections left without any document are still listed.
    pub async fn list_collections(&self) -> Result<Vec<CollectionReference>, FirebaseError> {
        let ids = self.firestore.store.read().await.collection_ids(Some(&self.path));
        ids.iter()
            .map(|id| self.collection(id))
            .collect()
    }

    /// Get the document snapshot
    ///
    /// A missing document is not an error: the snapshot reports
    /// `exists() == false`.
    pub async fn get(&self) -> Result<DocumentSnapshot, FirebaseError> {
        let store = self.firestore.store.read().await;
        let data = match store.get(&self.path) {
            Some(Node::Document(node)) => node.data.clone(),
            Some(Node::Collection(_)) | None => None,
        };
        trace!(path = %self.path, exists = data.is_some(), "Read document");
        Ok(DocumentSnapshot::new(self.clone(), data))
    }

    /// Create the document; fails with `AlreadyExists` when it exists
    pub async fn create(&self, data: impl IntoMapValue) -> Result<(), FirebaseError> {
        self.commit(WriteOperation::create(self, data)?).await
    }

    /// Set document data, replacing any existing fields
    pub async fn set(&self, data: impl IntoMapValue) -> Result<(), FirebaseError> {
        self.set_with_options(data, SetOptions::default()).await
    }

    /// Set document data with merge options
    pub async fn set_with_options(&self, data: impl IntoMapValue, options: SetOptions) -> Result<(), FirebaseError> {
        self.commit(WriteOperation::set(self, data, options)?).await
    }

    /// Update document fields; keys are dotted field paths
    ///
    /// Fails with `NotFound` when the document does not exist.
    pub async fn update(&self, data: impl IntoMapValue) -> Result<(), FirebaseError> {
        self.commit(WriteOperation::update(self, data)?).await
    }

    /// Update document fields given as field path / value pairs
    ///
    /// # Example
    /// ```
    /// use firestore_mock::firestore::{FieldPath, FieldValue, Firestore, Value};
    /// use serde_json::json;
    ///
    /// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
    /// let db = Firestore::new();
    /// let doc = db.doc("stats/site")?;
    /// doc.set(json!({ "visits": 1, "meta": { "owner": "ops" } })).await?;
    ///
    /// doc.update_fields([
    ///     (FieldPath::from_dot_separated("visits")?, FieldValue::increment(1)),
    ///     (FieldPath::new(["meta", "owner"])?, Value::from("web")),
    /// ])
    /// .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn update_fields<I, P, V>(&self, fields: I) -> Result<(), FirebaseError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: IntoFieldPath,
        V: Into<Value>,
    {
        self.commit(WriteOperation::update_fields(self, fields)?).await
    }

    /// Delete the document
    ///
    /// Deleting a missing document succeeds. Subcollections are kept.
    pub async fn delete(&self) -> Result<(), FirebaseError> {
        self.commit(WriteOperation::delete(self)).await
    }

    async fn commit(&self, operation: WriteOperation) -> Result<(), FirebaseError> {
        self.firestore.commit(vec![operation]).await?;
        Ok(())
    }
}

impl PartialEq for DocumentReference {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && Arc::ptr_eq(&self.firestore, &other.firestore)
    }
}

impl std::fmt::Debug for DocumentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReference")
            .field("path", &self.path.canonical_string())
            .field("project_id", &self.firestore.settings.project_id)
            .field("database_id", &self.firestore.settings.database_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::FirestoreError;
    use crate::firestore::{FieldValue, Firestore, MapValue};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let db = Firestore::new();
        let doc = db.doc("users/alice").unwrap();
        let data = json!({ "name": "Alice", "tags": ["a", "b"], "address": { "city": "Paris" } });

        doc.create(data.clone()).await.unwrap();
        assert_eq!(doc.get().await.unwrap().to_json(), data);

        let err = doc.create(json!({})).await.unwrap_err();
        assert!(matches!(err.as_firestore(), Some(FirestoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let db = Firestore::new();
        let err = db.doc("a/b").unwrap().update(json!({ "x": 1 })).await.unwrap_err();
        assert_eq!(err.code(), "not-found");
    }

    #[tokio::test]
    async fn test_parent_and_collection() {
        let db = Firestore::new();
        let doc = db.doc("users/alice").unwrap();
        assert_eq!(doc.parent().path(), "users");
        assert_eq!(doc.collection("posts").unwrap().path(), "users/alice/posts");
        assert_eq!(doc.collection("posts/p1/comments").unwrap().path(), "users/alice/posts/p1/comments");
        assert!(doc.collection("posts/p1").is_err());
    }

    #[tokio::test]
    async fn test_delete_keeps_subcollections() {
        let db = Firestore::new();
        let alice = db.doc("users/alice").unwrap();
        alice.set(json!({ "a": 1 })).await.unwrap();
        let post = alice.collection("posts").unwrap().doc("p1").unwrap();
        post.set(json!({ "title": "hi" })).await.unwrap();

        alice.delete().await.unwrap();
        assert!(!alice.get().await.unwrap().exists());
        assert!(post.get().await.unwrap().exists());

        let collections = alice.list_collections().await.unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].id(), "posts");

        // The parent no longer lists the deleted document
        let listed = db.collection("users").unwrap().list_documents().await.unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn test_server_timestamp_sentinel() {
        let db = Firestore::new();
        let doc = db.doc("c/d").unwrap();
        doc.set(MapValue::new().with("at", FieldValue::server_timestamp()))
            .await
            .unwrap();
        let snapshot = doc.get().await.unwrap();
        assert!(snapshot.get("at").and_then(|v| v.as_timestamp()).is_some());
    }
}
