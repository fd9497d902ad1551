//! In-memory Cloud Firestore
//!
//! A deterministic, network-free stand-in for a Firestore database: a
//! hierarchical document store with the backend's path rules, write-merge
//! semantics, field value sentinels and query engine.
//!
//! # Example
//! ```
//! # async fn example() -> Result<(), firestore_mock::FirebaseError> {
//! use firestore_mock::firestore::{Direction, Firestore, Query};
//! use serde_json::json;
//!
//! let db = Firestore::from_json(&json!({
//!     "users": [
//!         { "id": "alice", "data": { "age": 30 } },
//!         { "id": "bob", "data": { "age": 25 } }
//!     ]
//! }).to_string())?;
//!
//! let youngest = db
//!     .collection("users")?
//!     .order_by("age", Direction::Ascending)?
//!     .limit(1)
//!     .get()
//!     .await?;
//! assert_eq!(youngest.documents()[0].id(), "bob");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub mod firestore;

// Re-exports for convenience
pub use error::{FirebaseError, FirestoreError};

pub use firestore::{
    CollectionReference, DocumentReference, DocumentSnapshot, FieldValue, Firestore, Query,
    QuerySnapshot, Seed, Settings, Value,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types_exist() {
        let err: FirebaseError = FirestoreError::InvalidPath("a//b".into()).into();
        assert_eq!(err.code(), "invalid-argument");
    }
}
