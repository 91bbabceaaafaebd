//! Connection records for workspace data source association.
//!
//! A [`Connection`] is either a direct OpenSearch connection or a
//! direct-query connection owned by one. The JSON shape matches the one the
//! dashboards workspace form exchanges (`connectionType`, `type`,
//! `parentId`, `relatedConnections`).

use serde::{Deserialize, Serialize};

/// Engine tag used when a data source record carries none.
pub const DEFAULT_ENGINE: &str = "OpenSearch";

/// The two kinds of connection a workspace can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionType {
    OpenSearchConnection,
    DirectQueryConnection,
}

impl ConnectionType {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionType::OpenSearchConnection => "OpenSearch connection",
            ConnectionType::DirectQueryConnection => "Direct query connection",
        }
    }
}

/// Variant-specific relation data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "connectionType")]
pub enum ConnectionKind {
    /// A direct OpenSearch connection. `related_connections` lists the ids of
    /// its direct-query children; `None` means they are not resolved yet.
    #[serde(rename = "OpenSearchConnection", rename_all = "camelCase")]
    OpenSearch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        related_connections: Option<Vec<String>>,
    },
    /// A direct-query connection (S3, Prometheus, ...) owned by `parent_id`.
    #[serde(rename = "DirectQueryConnection", rename_all = "camelCase")]
    DirectQuery {
        #[serde(default)]
        parent_id: String,
    },
}

/// A uniquely identified data source connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Opaque id, unique within one catalog snapshot
    pub id: String,
    /// Display label (not unique)
    pub name: String,
    /// Engine/technology tag, informational only
    #[serde(rename = "type", default)]
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: ConnectionKind,
}

impl Connection {
    /// Create an OpenSearch connection whose children are not resolved yet.
    pub fn open_search(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            engine: DEFAULT_ENGINE.to_string(),
            description: None,
            kind: ConnectionKind::OpenSearch {
                related_connections: None,
            },
        }
    }

    /// Create a direct-query connection owned by `parent_id`.
    pub fn direct_query(
        id: impl Into<String>,
        name: impl Into<String>,
        parent_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            engine: String::new(),
            description: None,
            kind: ConnectionKind::DirectQuery {
                parent_id: parent_id.into(),
            },
        }
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the related children as resolved. No-op for direct-query connections.
    pub fn with_related<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if let ConnectionKind::OpenSearch {
            related_connections,
        } = &mut self.kind
        {
            *related_connections = Some(ids.into_iter().map(Into::into).collect());
        }
        self
    }

    pub fn connection_type(&self) -> ConnectionType {
        match self.kind {
            ConnectionKind::OpenSearch { .. } => ConnectionType::OpenSearchConnection,
            ConnectionKind::DirectQuery { .. } => ConnectionType::DirectQueryConnection,
        }
    }

    pub fn is_open_search(&self) -> bool {
        matches!(self.kind, ConnectionKind::OpenSearch { .. })
    }

    /// Parent id of a direct-query connection.
    pub fn parent_id(&self) -> Option<&str> {
        match &self.kind {
            ConnectionKind::DirectQuery { parent_id } if !parent_id.is_empty() => {
                Some(parent_id.as_str())
            }
            _ => None,
        }
    }

    /// Known child ids of an OpenSearch connection, `None` if unresolved.
    pub fn related_ids(&self) -> Option<&[String]> {
        match &self.kind {
            ConnectionKind::OpenSearch {
                related_connections,
            } => related_connections.as_deref(),
            ConnectionKind::DirectQuery { .. } => None,
        }
    }

    /// One-line description for list rows: engine plus relation hint.
    pub fn short_display(&self) -> String {
        let engine = if self.engine.is_empty() {
            self.connection_type().label()
        } else {
            self.engine.as_str()
        };
        match &self.kind {
            ConnectionKind::OpenSearch {
                related_connections: Some(ids),
            } if !ids.is_empty() => {
                let noun = if ids.len() == 1 {
                    "connection"
                } else {
                    "connections"
                };
                format!("{} ({} related {})", engine, ids.len(), noun)
            }
            _ => engine.to_string(),
        }
    }
}

/// Map a dashboards direct-query connector name to its engine tag.
pub fn engine_for_connector(connector: &str) -> String {
    match connector.trim().to_ascii_uppercase().as_str() {
        "S3GLUE" => "Amazon S3".to_string(),
        "PROMETHEUS" => "Prometheus".to_string(),
        "SECURITYLAKE" => "Security Lake".to_string(),
        "CLOUDWATCH" => "CloudWatch".to_string(),
        _ => connector.to_string(),
    }
}

/// A data source record as listed by the catalog service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawDataSource {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub data_source_engine_type: String,
    pub workspaces: Vec<String>,
    /// Direct-query children already known for this data source
    pub direct_query_connections: Option<Vec<RawDirectQuery>>,
}

impl RawDataSource {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A direct-query connection embedded in a data source record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawDirectQuery {
    pub id: Option<String>,
    pub name: String,
    pub connector: String,
}

impl RawDirectQuery {
    /// Convert into a connection owned by `parent_id`.
    ///
    /// Ids follow the dashboards convention `<parentId>-<name>` when the
    /// record has none.
    pub fn into_connection(self, parent_id: &str) -> Connection {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("{}-{}", parent_id, self.name));
        Connection::direct_query(id, self.name, parent_id)
            .with_engine(engine_for_connector(&self.connector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_search_json_shape() {
        let conn = Connection::open_search("ds1", "Data Source 1").with_related(Vec::<String>::new());
        let json = serde_json::to_value(&conn).unwrap();

        assert_eq!(json["id"], "ds1");
        assert_eq!(json["name"], "Data Source 1");
        assert_eq!(json["type"], "OpenSearch");
        assert_eq!(json["connectionType"], "OpenSearchConnection");
        assert_eq!(json["relatedConnections"], serde_json::json!([]));
    }

    #[test]
    fn test_direct_query_from_json() {
        let json = r#"{
            "id": "ds1-dqc1",
            "name": "dqc1",
            "parentId": "ds1",
            "connectionType": "DirectQueryConnection",
            "type": "Amazon S3"
        }"#;
        let conn: Connection = serde_json::from_str(json).unwrap();

        assert_eq!(conn.connection_type(), ConnectionType::DirectQueryConnection);
        assert_eq!(conn.parent_id(), Some("ds1"));
        assert_eq!(conn.engine, "Amazon S3");
        assert!(conn.related_ids().is_none());
    }

    #[test]
    fn test_unresolved_related_connections() {
        let json = r#"{"id":"ds2","name":"Data Source 2","connectionType":"OpenSearchConnection","type":"OpenSearch"}"#;
        let conn: Connection = serde_json::from_str(json).unwrap();

        assert!(conn.is_open_search());
        assert_eq!(conn.related_ids(), None);
    }

    #[test]
    fn test_empty_parent_id_is_none() {
        let conn = Connection::direct_query("x", "x", "");
        assert_eq!(conn.parent_id(), None);
    }

    #[test]
    fn test_with_related_ignored_for_direct_query() {
        let conn = Connection::direct_query("c1", "c1", "p").with_related(["a"]);
        assert_eq!(conn.related_ids(), None);
    }

    #[test]
    fn test_short_display() {
        let plain = Connection::open_search("ds1", "one");
        assert_eq!(plain.short_display(), "OpenSearch");

        let parent = Connection::open_search("ds1", "one").with_related(["a", "b"]);
        assert_eq!(parent.short_display(), "OpenSearch (2 related connections)");

        let child = Connection::direct_query("c", "c", "ds1");
        assert_eq!(child.short_display(), "Direct query connection");
    }

    #[test]
    fn test_engine_for_connector() {
        assert_eq!(engine_for_connector("S3GLUE"), "Amazon S3");
        assert_eq!(engine_for_connector("prometheus"), "Prometheus");
        assert_eq!(engine_for_connector("custom"), "custom");
    }

    #[test]
    fn test_raw_direct_query_default_id() {
        let raw = RawDirectQuery {
            id: None,
            name: "dqc1".to_string(),
            connector: "S3GLUE".to_string(),
        };
        let conn = raw.into_connection("ds1");

        assert_eq!(conn.id, "ds1-dqc1");
        assert_eq!(conn.parent_id(), Some("ds1"));
        assert_eq!(conn.engine, "Amazon S3");
    }

    #[test]
    fn test_raw_data_source_missing_fields() {
        let raw: RawDataSource = serde_json::from_str(r#"{"id":"ds1"}"#).unwrap();
        assert_eq!(raw.id, "ds1");
        assert!(raw.title.is_empty());
        assert!(raw.workspaces.is_empty());
        assert!(raw.direct_query_connections.is_none());
    }
}
