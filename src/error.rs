//! Error types
//!
//! Provides the error hierarchy shared by every operation of the in-memory
//! Firestore.
//!
//! # Design
//! Uses thiserror for ergonomic error definitions. `FirestoreError` carries the
//! backend-style taxonomy (invalid path, already exists, not found, invalid
//! argument); `FirebaseError` is the crate-wide type returned by public
//! operations and converts from every module-specific error via `From`.

use thiserror::Error;

/// Top-level error type
///
/// Wraps Firestore errors and seed parsing failures into a unified type.
///
/// # Example
/// ```
/// use firestore_mock::{FirebaseError, FirestoreError};
///
/// let err: FirebaseError = FirestoreError::NotFound("users/alice".into()).into();
/// assert_eq!(err.code(), "not-found");
/// ```
#[derive(Debug, Error)]
pub enum FirebaseError {
    /// Firestore-related errors
    #[error("Firestore error: {0}")]
    Firestore(#[from] FirestoreError),

    /// JSON serialization/deserialization errors (seed loading)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Firestore errors
///
/// Mirrors the status codes the emulated backend reports for the failures an
/// in-memory store can actually produce.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FirestoreError {
    /// Malformed resource path (empty segment, wrong parity for the requested kind)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// `create` targeted a document that already exists
    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    /// `update` targeted a document that does not exist
    #[error("No document to update: {0}")]
    NotFound(String),

    /// Invalid argument (conflicting options, undefined values, bad query)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FirebaseError {
    /// Backend status code of the error (e.g. `"not-found"`)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Firestore(err) => err.code(),
            Self::Serialization(_) => "invalid-argument",
        }
    }

    /// Returns the wrapped Firestore error, if any
    pub fn as_firestore(&self) -> Option<&FirestoreError> {
        match self {
            Self::Firestore(err) => Some(err),
            Self::Serialization(_) => None,
        }
    }
}

impl FirestoreError {
    /// Backend status code of the error
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPath(_) | Self::InvalidArgument(_) => "invalid-argument",
            Self::AlreadyExists(_) => "already-exists",
            Self::NotFound(_) => "not-found",
            Self::Internal(_) => "internal",
        }
    }

    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn invalid_path(msg: impl Into<String>) -> Self {
        Self::InvalidPath(msg.into())
    }
}
