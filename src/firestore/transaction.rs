//! Firestore transaction support

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::field_path::IntoFieldPath;
use super::field_value::{IntoMapValue, Value};
use super::mutation::SetOptions;
use super::path::ResourcePath;
use super::write_batch::WriteOperation;
use crate::error::{FirebaseError, FirestoreError};

/// Transaction for atomic read-write operations
///
/// The handle passed to a transaction function. All reads must be executed
/// before any writes; writes are queued and applied together, in call order,
/// once the function returns `Ok`. Cloning yields another handle to the same
/// transaction.
///
/// # Example
/// ```
/// use firestore_mock::firestore::Firestore;
/// use serde_json::json;
///
/// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
/// let db = Firestore::new();
/// let counter = db.doc("counters/visits")?;
///
/// let next = db
///     .run_transaction(|txn| {
///         let counter = counter.clone();
///         async move {
///             let snapshot = txn.get(&counter).await?;
///             let current = snapshot.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
///             txn.set(&counter, json!({ "count": current + 1 }))?;
///             Ok(current + 1)
///         }
///     })
///     .await?;
/// assert_eq!(next, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Transaction {
    state: Arc<Mutex<TransactionState>>,
}

#[derive(Default)]
struct TransactionState {
    /// Snapshots already read, so repeated reads agree
    reads: HashMap<ResourcePath, DocumentSnapshot>,
    /// Pending write operations
    writes: Vec<WriteOperation>,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TransactionState::default())),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TransactionState>, FirestoreError> {
        self.state
            .lock()
            .map_err(|_| FirestoreError::Internal("transaction state lock poisoned".to_string()))
    }

    fn ensure_no_writes(&self) -> Result<(), FirestoreError> {
        if !self.lock()?.writes.is_empty() {
            return Err(FirestoreError::invalid_argument(
                "Firestore transactions require all reads to be executed before all writes",
            ));
        }
        Ok(())
    }

    /// Get a document within the transaction
    ///
    /// Reading the same document twice returns the first snapshot.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if a write has already been queued.
    pub async fn get(&self, document: &DocumentReference) -> Result<DocumentSnapshot, FirebaseError> {
        self.ensure_no_writes()?;
        let cached = self.lock()?.reads.get(document.resource_path()).cloned();
        if let Some(cached) = cached {
            return Ok(cached);
        }

        let snapshot = document.get().await?;
        trace!(path = %document.resource_path(), "Transaction read");
        self.lock()?
            .reads
            .insert(document.resource_path().clone(), snapshot.clone());
        Ok(snapshot)
    }

    /// Get several documents within the transaction, in argument order
    pub async fn get_all(&self, documents: &[DocumentReference]) -> Result<Vec<DocumentSnapshot>, FirebaseError> {
        let mut snapshots = Vec::with_capacity(documents.len());
        for document in documents {
            snapshots.push(self.get(document).await?);
        }
        Ok(snapshots)
    }

    fn queue(&self, operation: WriteOperation) -> Result<(), FirebaseError> {
        self.lock()?.writes.push(operation);
        Ok(())
    }

    /// Create a document within the transaction
    pub fn create(&self, document: &DocumentReference, data: impl IntoMapValue) -> Result<(), FirebaseError> {
        self.queue(WriteOperation::create(document, data)?)
    }

    /// Set a document within the transaction, overwriting it
    pub fn set(&self, document: &DocumentReference, data: impl IntoMapValue) -> Result<(), FirebaseError> {
        self.queue(WriteOperation::set(document, data, SetOptions::default())?)
    }

    /// Set a document within the transaction with merge options
    pub fn set_with_options(
        &self,
        document: &DocumentReference,
        data: impl IntoMapValue,
        options: SetOptions,
    ) -> Result<(), FirebaseError> {
        self.queue(WriteOperation::set(document, data, options)?)
    }

    /// Update fields in a document within the transaction
    ///
    /// The document must exist when the transaction commits.
    pub fn update(&self, document: &DocumentReference, data: impl IntoMapValue) -> Result<(), FirebaseError> {
        self.queue(WriteOperation::update(document, data)?)
    }

    /// Update fields given as field path / value pairs
    pub fn update_fields<I, P, V>(&self, document: &DocumentReference, fields: I) -> Result<(), FirebaseError>
    where
        I: IntoIterator<Item = (P, V)>,
        P: IntoFieldPath,
        V: Into<Value>,
    {
        self.queue(WriteOperation::update_fields(document, fields)?)
    }

    /// Delete a document within the transaction
    pub fn delete(&self, document: &DocumentReference) -> Result<(), FirebaseError> {
        self.queue(WriteOperation::delete(document))
    }

    /// Number of queued writes
    pub fn pending_writes(&self) -> Result<usize, FirebaseError> {
        Ok(self.lock()?.writes.len())
    }

    pub(crate) fn take_writes(&self) -> Result<Vec<WriteOperation>, FirestoreError> {
        Ok(std::mem::take(&mut self.lock()?.writes))
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let writes = self.lock().map(|state| state.writes.len()).ok();
        f.debug_struct("Transaction").field("pending_writes", &writes).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{FirebaseError, FirestoreError};
    use crate::firestore::Firestore;
    use serde_json::json;

    #[tokio::test]
    async fn test_transaction_read_before_write() {
        let db = Firestore::new();
        let doc = db.doc("c/d").unwrap();

        let result: Result<(), FirebaseError> = db
            .run_transaction(|txn| {
                let doc = doc.clone();
                async move {
                    txn.set(&doc, json!({ "a": 1 }))?;
                    txn.get(&doc).await?;
                    Ok(())
                }
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err.as_firestore(), Some(FirestoreError::InvalidArgument(_))));
        // Nothing was applied
        assert!(!doc.get().await.unwrap().exists());
    }

    #[tokio::test]
    async fn test_writes_applied_in_order_on_success() {
        let db = Firestore::new();
        let doc = db.doc("c/d").unwrap();
        doc.set(json!({ "n": 1 })).await.unwrap();

        let seen = db
            .run_transaction(|txn| {
                let doc = doc.clone();
                async move {
                    let before = txn.get(&doc).await?;
                    txn.update(&doc, json!({ "n": 2 }))?;
                    txn.set_with_options(&doc, json!({ "m": 3 }), crate::firestore::SetOptions::merge())?;
                    assert_eq!(txn.pending_writes()?, 2);
                    Ok(before.get("n").and_then(|v| v.as_i64()))
                }
            })
            .await
            .unwrap();

        assert_eq!(seen, Some(1));
        assert_eq!(doc.get().await.unwrap().to_json(), json!({ "n": 2, "m": 3 }));
    }

    #[tokio::test]
    async fn test_repeated_reads_are_cached() {
        let db = Firestore::new();
        let doc = db.doc("c/d").unwrap();
        doc.set(json!({ "v": 1 })).await.unwrap();

        let (first, second) = db
            .run_transaction(|txn| {
                let doc = doc.clone();
                let outside = doc.clone();
                async move {
                    let first = txn.get(&doc).await?;
                    outside.set(json!({ "v": 2 })).await?;
                    let second = txn.get_all(&[doc]).await?;
                    Ok((first.to_json(), second[0].to_json()))
                }
            })
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
