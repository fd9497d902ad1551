//! Slash-delimited resource paths
//!
//! A document path has a nonzero even number of segments
//! (`users/alice`), a collection path an odd number (`users/alice/posts`).

use std::cmp::Ordering;
use std::fmt;

use crate::error::FirestoreError;

/// What a resource path is expected to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// Even number of segments
    Document,
    /// Odd number of segments
    Collection,
}

impl PathKind {
    /// Kind implied by a segment count
    pub fn of_len(len: usize) -> Self {
        if len % 2 == 0 {
            PathKind::Document
        } else {
            PathKind::Collection
        }
    }
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::Document => f.write_str("document"),
            PathKind::Collection => f.write_str("collection"),
        }
    }
}

/// Parsed resource path
///
/// Ordering is segment-by-segment, with a strict prefix sorting first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parse `path`, optionally enforcing the parity of `kind`
    ///
    /// Every segment must be non-empty, so an empty path, `a//b` and outer
    /// slashes (`/a`, `a/`) are all rejected.
    pub fn parse(path: &str, kind: Option<PathKind>) -> Result<Self, FirestoreError> {
        if path.is_empty() {
            return Err(FirestoreError::invalid_path(format!(
                "Path '{}' must contain at least one segment",
                path
            )));
        }

        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(FirestoreError::invalid_path(format!(
                "Path '{}' contains an empty segment",
                path
            )));
        }

        let parsed = Self { segments };
        if let Some(kind) = kind {
            parsed.expect_kind(kind)?;
        }
        Ok(parsed)
    }

    /// Wraps segments already known to be valid
    pub(crate) fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Parse a document path
    pub fn document(path: &str) -> Result<Self, FirestoreError> {
        Self::parse(path, Some(PathKind::Document))
    }

    /// Parse a collection path
    pub fn collection(path: &str) -> Result<Self, FirestoreError> {
        Self::parse(path, Some(PathKind::Collection))
    }

    fn expect_kind(&self, kind: PathKind) -> Result<(), FirestoreError> {
        if self.kind() == kind {
            return Ok(());
        }
        Err(FirestoreError::invalid_path(format!(
            "Path '{}' has {} segments; a {} path needs an {} number",
            self,
            self.len(),
            kind,
            match kind {
                PathKind::Document => "even",
                PathKind::Collection => "odd",
            }
        )))
    }

    /// Kind implied by the segment count
    pub fn kind(&self) -> PathKind {
        PathKind::of_len(self.segments.len())
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for a parsed path; provided for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Final segment (the document or collection id)
    pub fn last_segment(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path with `segment` appended
    ///
    /// `segment` must be non-empty and free of `/`.
    pub fn child(&self, segment: &str) -> Result<Self, FirestoreError> {
        validate_id(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    pub(crate) fn appended(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    /// Path without its final segment; `None` for single-segment paths
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Whether `self` is a (non-strict) prefix of `other`
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.len() <= other.len()
            && self.segments.iter().zip(&other.segments).all(|(l, r)| l == r)
    }

    /// Slash-joined form
    pub fn canonical_string(&self) -> String {
        self.segments.join("/")
    }
}

/// Validates a single document or collection id
pub(crate) fn validate_id(id: &str) -> Result<(), FirestoreError> {
    if id.is_empty() {
        return Err(FirestoreError::invalid_path("Identifier must not be empty"));
    }
    if id.contains('/') {
        return Err(FirestoreError::invalid_path(format!(
            "Identifier '{}' must not contain '/'",
            id
        )));
    }
    Ok(())
}

impl PartialOrd for ResourcePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResourcePath {
    fn cmp(&self, other: &Self) -> Ordering {
        for (left, right) in self.segments.iter().zip(&other.segments) {
            match left.cmp(right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.len().cmp(&other.len())
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}
