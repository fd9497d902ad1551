//! In-memory Firestore database
//!
//! [`Firestore`] owns the document tree behind an async read/write lock.
//! Every write (single document, batch or transaction) goes through
//! [`FirestoreInner::commit`], which resolves server timestamps once per
//! commit and applies the operations in order.

use std::future::Future;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::debug;

use super::collection_reference::CollectionReference;
use super::document_reference::DocumentReference;
use super::document_snapshot::DocumentSnapshot;
use super::mutation;
use super::path::ResourcePath;
use super::query::CollectionGroup;
use super::seed::Seed;
use super::settings::Settings;
use super::store::Store;
use super::transaction::Transaction;
use super::write_batch::{WriteBatch, WriteOperation};
use crate::error::{FirebaseError, FirestoreError};

/// Firestore database
///
/// Cheap to clone; clones share the same data.
///
/// # Example
/// ```
/// use firestore_mock::firestore::{Firestore, Query};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), firestore_mock::FirebaseError> {
/// let db = Firestore::from_json(&json!({
///     "animals": [
///         { "id": "monkey", "data": { "legCount": 2 } },
///         { "id": "elephant", "data": { "legCount": 4 } }
///     ]
/// }).to_string())?;
///
/// let four_legged = db
///     .collection("animals")?
///     .where_greater_than_or_equal_to("legCount", 4)?
///     .get()
///     .await?;
/// assert_eq!(four_legged.size(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Firestore {
    pub(crate) inner: Arc<FirestoreInner>,
}

pub(crate) struct FirestoreInner {
    pub(crate) settings: Settings,
    pub(crate) store: RwLock<Store>,
}

impl FirestoreInner {
    /// Fresh alphanumeric document id
    pub(crate) fn auto_id(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(self.settings.auto_id_length)
            .map(char::from)
            .collect()
    }

    /// Applies `operations` in order under one write lock
    ///
    /// Stops at the first failing write; the writes before it stay applied.
    pub(crate) async fn commit(&self, operations: Vec<WriteOperation>) -> Result<(), FirestoreError> {
        if operations.is_empty() {
            return Ok(());
        }

        let server_time = self.settings.server_time();
        let count = operations.len();
        let mut store = self.store.write().await;
        for (index, operation) in operations.into_iter().enumerate() {
            let path = operation.path().clone();
            mutation::apply_write(&mut store, operation, server_time).map_err(|err| {
                debug!(path = %path, index, error = %err, "Write failed");
                err
            })?;
        }
        debug!(writes = count, "Committed writes");
        Ok(())
    }
}

impl Firestore {
    /// An empty database with default settings
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    /// An empty database
    pub fn with_settings(settings: Settings) -> Self {
        Self::from_store(Store::new(), settings)
    }

    /// A database holding the contents of `seed`
    pub fn from_seed(seed: Seed) -> Result<Self, FirebaseError> {
        Self::from_seed_with_settings(seed, Settings::default())
    }

    /// A database holding the contents of `seed`, with custom settings
    pub fn from_seed_with_settings(seed: Seed, settings: Settings) -> Result<Self, FirebaseError> {
        Ok(Self::from_store(seed.into_store()?, settings))
    }

    /// A database seeded from the JSON literal form of [`Seed`]
    pub fn from_json(json: &str) -> Result<Self, FirebaseError> {
        Self::from_seed(Seed::from_json(json)?)
    }

    fn from_store(store: Store, settings: Settings) -> Self {
        debug!(
            project_id = %settings.project_id,
            database_id = %settings.database_id,
            "Created in-memory Firestore"
        );
        Self {
            inner: Arc::new(FirestoreInner {
                settings,
                store: RwLock::new(store),
            }),
        }
    }

    /// Replace the whole database with the contents of `seed`
    pub async fn reset(&self, seed: Seed) -> Result<(), FirebaseError> {
        let store = seed.into_store()?;
        *self.inner.store.write().await = store;
        debug!("Reset database from seed");
        Ok(())
    }

    /// Settings the database was created with
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Get the project ID
    pub fn project_id(&self) -> &str {
        &self.inner.settings.project_id
    }

    /// Get the database ID
    pub fn database_id(&self) -> &str {
        &self.inner.settings.database_id
    }

    /// Get a reference to a collection
    ///
    /// `path` must have an odd number of segments (`"users"`,
    /// `"users/alice/posts"`).
    pub fn collection(&self, path: &str) -> Result<CollectionReference, FirebaseError> {
        let path = ResourcePath::collection(path)?;
        Ok(CollectionReference::new(path, Arc::clone(&self.inner)))
    }

    /// Get a reference to a document
    ///
    /// `path` must have an even number of segments (`"users/alice"`).
    pub fn doc(&self, path: &str) -> Result<DocumentReference, FirebaseError> {
        let path = ResourcePath::document(path)?;
        Ok(DocumentReference::new(path, Arc::clone(&self.inner)))
    }

    /// Create a collection group query
    ///
    /// Matches every document in a collection or subcollection whose id is
    /// `collection_id`, at any depth. The id cannot contain a slash.
    pub fn collection_group(&self, collection_id: &str) -> Result<CollectionGroup, FirebaseError> {
        Ok(CollectionGroup::new(collection_id, Arc::clone(&self.inner))?)
    }

    /// Create a new write batch
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new(Arc::clone(&self.inner))
    }

    /// Read several documents, in argument order
    pub async fn get_all(&self, documents: &[DocumentReference]) -> Result<Vec<DocumentSnapshot>, FirebaseError> {
        let mut snapshots = Vec::with_capacity(documents.len());
        for document in documents {
            snapshots.push(document.get().await?);
        }
        Ok(snapshots)
    }

    /// Top-level collections, in name order
    pub async fn list_collections(&self) -> Result<Vec<CollectionReference>, FirebaseError> {
        let ids = self.inner.store.read().await.collection_ids(None);
        ids.iter().map(|id| self.collection(id)).collect()
    }

    /// Run a transaction
    ///
    /// `update_fn` receives a [`Transaction`] handle. Its writes are applied
    /// together, in call order, only when the returned future resolves to
    /// `Ok`; on `Err` nothing is written and the error is returned. The
    /// function runs exactly once.
    pub async fn run_transaction<F, Fut, R>(&self, update_fn: F) -> Result<R, FirebaseError>
    where
        F: FnOnce(Transaction) -> Fut,
        Fut: Future<Output = Result<R, FirebaseError>>,
    {
        let transaction = Transaction::new();
        let result = match update_fn(transaction.clone()).await {
            Ok(result) => result,
            Err(err) => {
                debug!(error = %err, "Transaction aborted");
                return Err(err);
            }
        };

        let writes = transaction.take_writes()?;
        debug!(writes = writes.len(), "Committing transaction");
        self.inner.commit(writes).await?;
        Ok(result)
    }
}

impl Default for Firestore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Firestore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Firestore")
            .field("project_id", &self.project_id())
            .field("database_id", &self.database_id())
            .finish()
    }
}
