//! Advisory validation errors shown next to the assigned connections.
//!
//! Errors never block a selection operation; they only decide whether an
//! error line accompanies the table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::source::Connection;

/// Field carrying data source errors in the workspace form.
pub const DATA_SOURCES_FIELD: &str = "selectedDataSourceConnections";

/// Field name to message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.0.insert(field.into(), message.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Message for the data source field, if any.
    pub fn data_sources(&self) -> Option<&str> {
        self.get(DATA_SOURCES_FIELD)
    }
}

/// Host-side check mirroring the workspace form rule.
pub fn validate_assigned(assigned: &[Connection], require_data_source: bool) -> FieldErrors {
    if require_data_source && !assigned.iter().any(Connection::is_open_search) {
        FieldErrors::new().with(DATA_SOURCES_FIELD, "At least one data source is required.")
    } else {
        FieldErrors::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_lookup() {
        let errors = FieldErrors::new().with(DATA_SOURCES_FIELD, "required");
        assert_eq!(errors.data_sources(), Some("required"));
        assert_eq!(errors.get("name"), None);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_field_errors_json() {
        let errors: FieldErrors =
            serde_json::from_str(r#"{"selectedDataSourceConnections": "pick one"}"#).unwrap();
        assert_eq!(errors.data_sources(), Some("pick one"));
    }

    #[test]
    fn test_validate_requires_open_search_connection() {
        let only_child = vec![Connection::direct_query("c", "c", "p")];
        assert!(validate_assigned(&only_child, true).data_sources().is_some());
        assert!(validate_assigned(&[], false).is_empty());

        let with_parent = vec![Connection::open_search("p", "p")];
        assert!(validate_assigned(&with_parent, true).is_empty());
    }
}
