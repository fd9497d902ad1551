//! In-memory Cloud Firestore
//!
//! # Module layout
//! - `path.rs`, `field_path.rs`: resource paths and field paths
//! - `field_value.rs`, `timestamp.rs`, `geo_point.rs`: document values
//! - `store.rs`, `seed.rs`: the document tree and how it is seeded
//! - `mutation.rs`: create / set / update / delete and sentinel resolution
//! - `query.rs`, `query_evaluator.rs`, `aggregate_query.rs`: queries
//! - `document_reference.rs`, `collection_reference.rs`: references
//! - `document_snapshot.rs`, `query_snapshot.rs`: read results
//! - `write_batch.rs`, `transaction.rs`: multi-document writes

pub mod aggregate_query;
pub mod collection_reference;
pub mod document_reference;
pub mod document_snapshot;
pub mod field_path;
pub mod field_value;
pub mod geo_point;
pub mod mutation;
pub mod path;
pub mod query;
mod query_evaluator;
pub mod query_snapshot;
pub mod seed;
pub mod settings;
mod store;
pub mod timestamp;
pub mod write_batch;

/// Database entry point
pub mod firestore;
/// Transaction support for atomic read-write operations
pub mod transaction;

pub use firestore::Firestore;

pub use field_value::{FieldValue, FilterOperator, IntoMapValue, MapValue, Number, Value};

pub use field_path::{FieldPath, IntoFieldPath};

pub use path::{PathKind, ResourcePath};

pub use query::{CollectionGroup, Cursor, Direction, Query, QueryFilter};

pub use aggregate_query::{AggregateField, AggregateQuery, AggregateQuerySnapshot, AggregationType};

pub use timestamp::Timestamp;

pub use geo_point::GeoPoint;

pub use settings::Settings;

pub use seed::{Seed, SeedDocument};

pub use mutation::SetOptions;

pub use document_reference::DocumentReference;

pub use document_snapshot::DocumentSnapshot;

pub use collection_reference::CollectionReference;

pub use query_snapshot::QuerySnapshot;

pub use write_batch::{WriteBatch, WriteOperation};

pub use transaction::Transaction;
