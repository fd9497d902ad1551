//! Result of running a query

use super::document_snapshot::DocumentSnapshot;

/// Query snapshot containing multiple documents
///
/// Immutable; documents appear in query order.
#[derive(Debug, Clone, Default)]
pub struct QuerySnapshot {
    documents: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub(crate) fn new(documents: Vec<DocumentSnapshot>) -> Self {
        Self { documents }
    }

    /// Documents in result order
    pub fn documents(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    /// Alias of [`QuerySnapshot::documents`]
    pub fn docs(&self) -> &[DocumentSnapshot] {
        &self.documents
    }

    /// Number of documents
    pub fn size(&self) -> usize {
        self.documents.len()
    }

    /// Get the number of documents in the snapshot
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the query result is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Calls `f` on every document, in order
    pub fn for_each<F: FnMut(&DocumentSnapshot)>(&self, f: F) {
        self.documents.iter().for_each(f)
    }

    /// Iterator over the documents
    pub fn iter(&self) -> std::slice::Iter<'_, DocumentSnapshot> {
        self.documents.iter()
    }
}

impl IntoIterator for QuerySnapshot {
    type Item = DocumentSnapshot;
    type IntoIter = std::vec::IntoIter<DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.into_iter()
    }
}

impl<'a> IntoIterator for &'a QuerySnapshot {
    type Item = &'a DocumentSnapshot;
    type IntoIter = std::slice::Iter<'a, DocumentSnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.documents.iter()
    }
}
