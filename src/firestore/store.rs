//! Hierarchical in-memory document store
//!
//! The tree alternates collection and document levels. Top-level collections
//! are keyed by name; a collection keeps its documents in insertion order; a
//! document owns its data plus named subcollections, created on demand.
//!
//! A document node without data is a placeholder: it exists only because a
//! subcollection was written beneath it (or survived a delete). Reads,
//! listings and queries skip placeholders.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use super::field_value::MapValue;
use super::path::{PathKind, ResourcePath};
use crate::error::FirestoreError;

/// A collection level of the tree
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CollectionNode {
    pub(crate) id: String,
    pub(crate) documents: Vec<DocumentNode>,
}

/// A document level of the tree
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DocumentNode {
    pub(crate) id: String,
    pub(crate) data: Option<MapValue>,
    pub(crate) subcollections: BTreeMap<String, CollectionNode>,
}

/// Result of a path lookup
#[derive(Debug, Clone, Copy)]
pub(crate) enum Node<'a> {
    Document(&'a DocumentNode),
    Collection(&'a CollectionNode),
}

impl CollectionNode {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            documents: Vec::new(),
        }
    }

    pub(crate) fn document(&self, id: &str) -> Option<&DocumentNode> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Documents holding data, in insertion order
    pub(crate) fn existing_documents(&self) -> impl Iterator<Item = &DocumentNode> {
        self.documents.iter().filter(|doc| doc.exists())
    }

    /// The document `id`, appended as a placeholder when missing
    fn document_entry(&mut self, id: &str) -> &mut DocumentNode {
        let index = match self.documents.iter().position(|doc| doc.id == id) {
            Some(index) => index,
            None => {
                trace!(collection = %self.id, document = id, "Auto-creating document node");
                self.documents.push(DocumentNode::new(id));
                self.documents.len() - 1
            }
        };
        &mut self.documents[index]
    }
}

impl DocumentNode {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            data: None,
            subcollections: BTreeMap::new(),
        }
    }

    pub(crate) fn exists(&self) -> bool {
        self.data.is_some()
    }

    fn subcollection_entry(&mut self, id: &str) -> &mut CollectionNode {
        self.subcollections
            .entry(id.to_string())
            .or_insert_with(|| CollectionNode::new(id))
    }
}

/// The whole database tree
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Store {
    collections: BTreeMap<String, CollectionNode>,
}

impl Store {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Looks up the node at `path`; `None` when any node along it is missing
    pub(crate) fn get(&self, path: &ResourcePath) -> Option<Node<'_>> {
        match path.kind() {
            PathKind::Collection => self.collection(path).map(Node::Collection),
            PathKind::Document => self.document_node(path).map(Node::Document),
        }
    }

    /// The collection at `path`
    pub(crate) fn collection(&self, path: &ResourcePath) -> Option<&CollectionNode> {
        if path.kind() != PathKind::Collection {
            return None;
        }
        let (first, rest) = path.segments().split_first()?;
        let mut collection = self.collections.get(first)?;
        for pair in rest.chunks_exact(2) {
            collection = collection.document(&pair[0])?.subcollections.get(&pair[1])?;
        }
        Some(collection)
    }

    /// The document node at `path`, placeholders included
    pub(crate) fn document_node(&self, path: &ResourcePath) -> Option<&DocumentNode> {
        if path.kind() != PathKind::Document {
            return None;
        }
        let parent = path.parent()?;
        self.collection(&parent)?.document(path.last_segment())
    }

    /// Data of the existing document at `path`
    pub(crate) fn document(&self, path: &ResourcePath) -> Option<&MapValue> {
        self.document_node(path)?.data.as_ref()
    }

    /// Auto-vivifies every node along `path`
    ///
    /// For a document path, `data` (when given) replaces the document's data;
    /// repeating the call on an existing document updates it.
    pub(crate) fn create_path(
        &mut self,
        path: &ResourcePath,
        data: Option<MapValue>,
    ) -> Result<(), FirestoreError> {
        match path.kind() {
            PathKind::Collection => {
                self.collection_entry(path)?;
            }
            PathKind::Document => {
                let node = self.document_entry(path)?;
                if let Some(data) = data {
                    debug!(path = %path, fields = data.len(), "Storing document");
                    node.data = Some(data);
                }
            }
        }
        Ok(())
    }

    /// Stores `data` as document `id` of the collection at `collection_path`
    ///
    /// New ids are appended, keeping insertion order; an existing id is
    /// updated in place.
    pub(crate) fn add_document(
        &mut self,
        collection_path: &ResourcePath,
        id: &str,
        data: MapValue,
    ) -> Result<(), FirestoreError> {
        let collection = self.collection_entry(collection_path)?;
        debug!(collection = %collection_path, document = id, "Adding document");
        collection.document_entry(id).data = Some(data);
        Ok(())
    }

    /// Removes document `id` from the collection at `collection_path`
    ///
    /// Missing collections or documents are a no-op. Subcollections are not
    /// cascaded: a document that still owns any stays behind as a placeholder.
    /// Returns whether a document with data was removed.
    pub(crate) fn delete_document(&mut self, collection_path: &ResourcePath, id: &str) -> bool {
        let Some(collection) = self.collection_mut(collection_path) else {
            trace!(collection = %collection_path, document = id, "Delete of missing collection");
            return false;
        };
        let Some(index) = collection.documents.iter().position(|doc| doc.id == id) else {
            trace!(collection = %collection_path, document = id, "Delete of missing document");
            return false;
        };

        let existed = collection.documents[index].exists();
        if collection.documents[index].subcollections.is_empty() {
            collection.documents.remove(index);
        } else {
            collection.documents[index].data = None;
        }
        debug!(collection = %collection_path, document = id, existed, "Deleted document");
        existed
    }

    /// Ids of the collections directly under `parent` (the root when `None`)
    pub(crate) fn collection_ids(&self, parent: Option<&ResourcePath>) -> Vec<String> {
        match parent {
            None => self.collections.keys().cloned().collect(),
            Some(path) => self
                .document_node(path)
                .map(|doc| doc.subcollections.keys().cloned().collect())
                .unwrap_or_default(),
        }
    }

    /// Every existing document living in a collection named `collection_id`
    ///
    /// Walks the tree with an explicit stack: top-level collections in name
    /// order, each collection's documents before the collections beneath them,
    /// documents in insertion order and subcollections in name order.
    pub(crate) fn collection_group_documents(
        &self,
        collection_id: &str,
    ) -> Vec<(ResourcePath, &DocumentNode)> {
        let mut found = Vec::new();
        let mut stack: Vec<(Vec<String>, &CollectionNode)> = self
            .collections
            .values()
            .rev()
            .map(|collection| (vec![collection.id.clone()], collection))
            .collect();

        while let Some((segments, collection)) = stack.pop() {
            if collection.id == collection_id {
                for doc in collection.existing_documents() {
                    let mut doc_segments = segments.clone();
                    doc_segments.push(doc.id.clone());
                    found.push((ResourcePath::from_segments(doc_segments), doc));
                }
            }

            for doc in collection.documents.iter().rev() {
                for sub in doc.subcollections.values().rev() {
                    let mut sub_segments = segments.clone();
                    sub_segments.push(doc.id.clone());
                    sub_segments.push(sub.id.clone());
                    stack.push((sub_segments, sub));
                }
            }
        }

        trace!(collection_id, count = found.len(), "Collected collection group");
        found
    }

    fn collection_mut(&mut self, path: &ResourcePath) -> Option<&mut CollectionNode> {
        if path.kind() != PathKind::Collection {
            return None;
        }
        let (first, rest) = path.segments().split_first()?;
        let mut collection = self.collections.get_mut(first)?;
        for pair in rest.chunks_exact(2) {
            collection = collection
                .documents
                .iter_mut()
                .find(|doc| doc.id == pair[0])?
                .subcollections
                .get_mut(&pair[1])?;
        }
        Some(collection)
    }

    fn collection_entry(&mut self, path: &ResourcePath) -> Result<&mut CollectionNode, FirestoreError> {
        if path.kind() != PathKind::Collection {
            return Err(FirestoreError::invalid_path(format!(
                "'{}' is not a collection path",
                path
            )));
        }
        let Some((first, rest)) = path.segments().split_first() else {
            return Err(FirestoreError::invalid_path("Empty collection path"));
        };

        let mut collection = self
            .collections
            .entry(first.clone())
            .or_insert_with(|| CollectionNode::new(first));
        for pair in rest.chunks_exact(2) {
            collection = collection
                .document_entry(&pair[0])
                .subcollection_entry(&pair[1]);
        }
        Ok(collection)
    }

    fn document_entry(&mut self, path: &ResourcePath) -> Result<&mut DocumentNode, FirestoreError> {
        let parent = match (path.kind(), path.parent()) {
            (PathKind::Document, Some(parent)) => parent,
            _ => {
                return Err(FirestoreError::invalid_path(format!(
                    "'{}' is not a document path",
                    path
                )))
            }
        };
        let collection = self.collection_entry(&parent)?;
        Ok(collection.document_entry(path.last_segment()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(p: &str) -> ResourcePath {
        ResourcePath::parse(p, None).unwrap()
    }

    fn data(value: serde_json::Value) -> MapValue {
        MapValue::try_from(value).unwrap()
    }

    #[test]
    fn test_missing_nodes_read_as_none() {
        let store = Store::new();
        assert!(store.get(&path("users")).is_none());
        assert!(store.get(&path("users/alice")).is_none());
        assert!(store.get(&path("users/alice/posts/p1")).is_none());
    }

    #[test]
    fn test_create_path_auto_vivifies() {
        let mut store = Store::new();
        store
            .create_path(&path("users/alice/posts/p1"), Some(data(json!({"title": "hi"}))))
            .unwrap();

        // Intermediate document is a placeholder
        let alice = store.document_node(&path("users/alice")).unwrap();
        assert!(!alice.exists());
        assert!(store.document(&path("users/alice")).is_none());

        assert_eq!(
            store.document(&path("users/alice/posts/p1")),
            Some(&data(json!({"title": "hi"})))
        );
        assert!(matches!(
            store.get(&path("users/alice/posts")),
            Some(Node::Collection(_))
        ));
    }

    #[test]
    fn test_create_path_updates_existing() {
        let mut store = Store::new();
        store.create_path(&path("a/b"), Some(data(json!({"v": 1})))).unwrap();
        store.create_path(&path("a/b"), Some(data(json!({"v": 2})))).unwrap();
        assert_eq!(store.collection(&path("a")).unwrap().documents.len(), 1);
        assert_eq!(store.document(&path("a/b")), Some(&data(json!({"v": 2}))));
    }

    #[test]
    fn test_add_document_preserves_insertion_order() {
        let mut store = Store::new();
        let animals = path("animals");
        for id in ["zebra", "ant", "moose"] {
            store.add_document(&animals, id, MapValue::new()).unwrap();
        }
        let ids: Vec<_> = store
            .collection(&animals)
            .unwrap()
            .documents
            .iter()
            .map(|doc| doc.id.as_str())
            .collect();
        assert_eq!(ids, ["zebra", "ant", "moose"]);
    }

    #[test]
    fn test_delete_document() {
        let mut store = Store::new();
        let users = path("users");
        store.add_document(&users, "alice", MapValue::new()).unwrap();

        assert!(store.delete_document(&users, "alice"));
        assert!(store.collection(&users).unwrap().documents.is_empty());

        // Missing document and missing collection are no-ops
        assert!(!store.delete_document(&users, "alice"));
        assert!(!store.delete_document(&path("nobody"), "x"));
    }

    #[test]
    fn test_delete_does_not_cascade() {
        let mut store = Store::new();
        store.create_path(&path("users/alice"), Some(MapValue::new())).unwrap();
        store
            .create_path(&path("users/alice/posts/p1"), Some(data(json!({"n": 1}))))
            .unwrap();

        assert!(store.delete_document(&path("users"), "alice"));
        assert!(store.document(&path("users/alice")).is_none());
        assert!(store.document(&path("users/alice/posts/p1")).is_some());
    }

    #[test]
    fn test_collection_ids() {
        let mut store = Store::new();
        store.create_path(&path("b/x/sub2/y"), Some(MapValue::new())).unwrap();
        store.create_path(&path("b/x/sub1/y"), Some(MapValue::new())).unwrap();
        store.create_path(&path("a"), None).unwrap();

        assert_eq!(store.collection_ids(None), ["a", "b"]);
        assert_eq!(store.collection_ids(Some(&path("b/x"))), ["sub1", "sub2"]);
        assert!(store.collection_ids(Some(&path("b/missing"))).is_empty());
    }

    #[test]
    fn test_collection_group_traversal_order() {
        let mut store = Store::new();
        store.create_path(&path("posts/top"), Some(MapValue::new())).unwrap();
        store.create_path(&path("users/bob/posts/b1"), Some(MapValue::new())).unwrap();
        store.create_path(&path("users/alice/posts/a1"), Some(MapValue::new())).unwrap();
        store
            .create_path(&path("users/alice/posts/a1/posts/deep"), Some(MapValue::new()))
            .unwrap();
        store.create_path(&path("users/alice/drafts/d1"), Some(MapValue::new())).unwrap();

        let found: Vec<String> = store
            .collection_group_documents("posts")
            .into_iter()
            .map(|(path, _)| path.to_string())
            .collect();
        assert_eq!(
            found,
            [
                "posts/top",
                "users/bob/posts/b1",
                "users/alice/posts/a1",
                "users/alice/posts/a1/posts/deep",
            ]
        );
    }
}
