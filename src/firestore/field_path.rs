//! Field paths addressing values inside a document
//!
//! `"address.city"` addresses the `city` key of the `address` map.

use std::fmt;

use crate::error::FirestoreError;

const DOCUMENT_ID: &str = "__name__";

/// Path to a (possibly nested) field of a document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Build from explicit segments; segments may contain dots
    pub fn new<S, I>(segments: I) -> Result<Self, FirestoreError>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(FirestoreError::invalid_argument(
                "FieldPath must contain at least one segment",
            ));
        }
        if segments.iter().any(String::is_empty) {
            return Err(FirestoreError::invalid_argument(
                "FieldPath segments must not be empty",
            ));
        }
        Ok(Self { segments })
    }

    /// Parse a dot-separated path such as `"a.b.c"`
    pub fn from_dot_separated(path: &str) -> Result<Self, FirestoreError> {
        if path.trim().is_empty() {
            return Err(FirestoreError::invalid_argument(
                "FieldPath string cannot be empty",
            ));
        }
        FieldPath::new(path.split('.')).map_err(|_| {
            FirestoreError::invalid_argument(format!(
                "Invalid field path '{}': paths must not start or end with '.' or contain '..'",
                path
            ))
        })
    }

    /// Special path addressing the document identifier
    pub fn document_id() -> Self {
        Self {
            segments: vec![DOCUMENT_ID.to_string()],
        }
    }

    /// Whether this is [`FieldPath::document_id`]
    pub fn is_document_id(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == DOCUMENT_ID
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Dot-joined form
    pub fn canonical_string(&self) -> String {
        self.segments.join(".")
    }

    /// Child path
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_string())
    }
}

/// Converts common user inputs into a validated [`FieldPath`]
pub trait IntoFieldPath {
    /// Validate and convert
    fn into_field_path(self) -> Result<FieldPath, FirestoreError>;
}

impl IntoFieldPath for FieldPath {
    fn into_field_path(self) -> Result<FieldPath, FirestoreError> {
        Ok(self)
    }
}

impl IntoFieldPath for &FieldPath {
    fn into_field_path(self) -> Result<FieldPath, FirestoreError> {
        Ok(self.clone())
    }
}

impl IntoFieldPath for String {
    fn into_field_path(self) -> Result<FieldPath, FirestoreError> {
        FieldPath::from_dot_separated(&self)
    }
}

impl IntoFieldPath for &String {
    fn into_field_path(self) -> Result<FieldPath, FirestoreError> {
        FieldPath::from_dot_separated(self)
    }
}

impl IntoFieldPath for &str {
    fn into_field_path(self) -> Result<FieldPath, FirestoreError> {
        FieldPath::from_dot_separated(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_dot_path() {
        let field = FieldPath::from_dot_separated("foo.bar").unwrap();
        assert_eq!(field.segments(), &["foo", "bar"]);
        assert_eq!(field.to_string(), "foo.bar");
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(FieldPath::from_dot_separated("").is_err());
        assert!(FieldPath::from_dot_separated("a..b").is_err());
        assert!(FieldPath::from_dot_separated(".a").is_err());
        assert!(FieldPath::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn explicit_segments_keep_dots() {
        let field = FieldPath::new(["a.b", "c"]).unwrap();
        assert_eq!(field.segments().len(), 2);
    }

    #[test]
    fn document_id_path() {
        assert!(FieldPath::document_id().is_document_id());
        assert!(!"name".into_field_path().unwrap().is_document_id());
    }
}
