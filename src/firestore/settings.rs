//! Firestore Settings
//!
//! Configuration of an in-memory [`Firestore`](super::Firestore) instance.

use super::timestamp::Timestamp;

/// Settings for configuring Firestore behavior
///
/// # Example
/// ```
/// use firestore_mock::firestore::{Settings, Timestamp};
///
/// let settings = Settings::new()
///     .with_project_id("demo")
///     .with_fixed_server_time(Timestamp::from_millis(0));
/// assert_eq!(settings.project_id, "demo");
/// ```
#[derive(Debug, Clone)]
pub struct Settings {
    /// Project the emulated database belongs to
    ///
    /// Default: "mock-project"
    pub project_id: String,

    /// Database identifier
    ///
    /// Default: "(default)"
    pub database_id: String,

    /// Length of generated document identifiers
    ///
    /// Default: 20
    pub auto_id_length: usize,

    /// Time every server-timestamp sentinel resolves to
    ///
    /// When `None`, the wall clock at write time is used.
    pub fixed_server_time: Option<Timestamp>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_id: "mock-project".to_string(),
            database_id: "(default)".to_string(),
            auto_id_length: Self::DEFAULT_AUTO_ID_LENGTH,
            fixed_server_time: None,
        }
    }
}

impl Settings {
    /// Length of the alphanumeric ids the backend generates
    pub const DEFAULT_AUTO_ID_LENGTH: usize = 20;

    /// Creates default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the project id
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = project_id.into();
        self
    }

    /// Set the database id
    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    /// Set the generated id length (at least 1)
    pub fn with_auto_id_length(mut self, length: usize) -> Self {
        self.auto_id_length = length.max(1);
        self
    }

    /// Pin server timestamps to `time`
    pub fn with_fixed_server_time(mut self, time: Timestamp) -> Self {
        self.fixed_server_time = Some(time);
        self
    }

    /// Time a server-timestamp sentinel resolves to right now
    pub(crate) fn server_time(&self) -> Timestamp {
        self.fixed_server_time.unwrap_or_else(Timestamp::now)
    }

    /// `projects/{project}/databases/{database}`
    pub fn database_name(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.project_id, "mock-project");
        assert_eq!(settings.database_id, "(default)");
        assert_eq!(settings.auto_id_length, 20);
        assert!(settings.fixed_server_time.is_none());
        assert_eq!(settings.database_name(), "projects/mock-project/databases/(default)");
    }

    #[test]
    fn test_settings_fixed_server_time() {
        let fixed = Timestamp::new(42, 7).unwrap();
        let settings = Settings::new().with_fixed_server_time(fixed);
        assert_eq!(settings.server_time(), fixed);
        assert_eq!(settings.server_time(), fixed);
    }

    #[test]
    fn test_settings_auto_id_length_floor() {
        assert_eq!(Settings::new().with_auto_id_length(0).auto_id_length, 1);
    }
}
