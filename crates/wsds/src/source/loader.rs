//! Catalog loaders: the collaborator that lists available connections.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::connection::{Connection, RawDataSource, RawDirectQuery};

/// Failure to load catalog data. Always recoverable.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("catalog service unreachable: {0}")]
    Unreachable(String),

    #[error("unexpected response from {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to decode catalog data: {0}")]
    Decode(String),

    #[error("failed to read catalog file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid catalog url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Source of data source records and their direct-query children.
///
/// Implementations block; the panel runs them off the UI thread.
pub trait CatalogLoader: Send + Sync {
    /// List every known data source.
    fn list_data_sources(&self) -> Result<Vec<RawDataSource>, LoadError>;

    /// Fetch the direct-query connections owned by `parent_id`.
    fn fetch_direct_query_connections(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Connection>, LoadError>;
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    data_sources: Vec<RawDataSource>,
    direct_query: Vec<Connection>,
    fail_listing: bool,
    fail_children: bool,
    failing_parents: Vec<String>,
}

impl StaticCatalog {
    pub fn new(data_sources: Vec<RawDataSource>) -> Self {
        Self {
            data_sources,
            ..Default::default()
        }
    }

    pub fn with_direct_query(mut self, connections: Vec<Connection>) -> Self {
        self.direct_query = connections;
        self
    }

    /// Make `list_data_sources` fail.
    pub fn failing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Make `fetch_direct_query_connections` fail for every parent.
    pub fn failing_children(mut self) -> Self {
        self.fail_children = true;
        self
    }

    /// Make `fetch_direct_query_connections` fail for `parent_id` only.
    pub fn failing_children_of(mut self, parent_id: impl Into<String>) -> Self {
        self.failing_parents.push(parent_id.into());
        self
    }
}

impl CatalogLoader for StaticCatalog {
    fn list_data_sources(&self) -> Result<Vec<RawDataSource>, LoadError> {
        if self.fail_listing {
            return Err(LoadError::Unreachable("static catalog offline".to_string()));
        }
        Ok(self.data_sources.clone())
    }

    fn fetch_direct_query_connections(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Connection>, LoadError> {
        if self.fail_children || self.failing_parents.iter().any(|p| p == parent_id) {
            return Err(LoadError::Unreachable(format!(
                "no direct query connections for '{}'",
                parent_id
            )));
        }
        Ok(self
            .direct_query
            .iter()
            .filter(|c| c.parent_id() == Some(parent_id))
            .cloned()
            .collect())
    }
}

/// On-disk catalog layout shared by the TOML and JSON formats.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CatalogDocument {
    data_sources: Vec<RawDataSource>,
    direct_query_connections: Vec<FileDirectQuery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct FileDirectQuery {
    parent_id: String,
    #[serde(flatten)]
    connection: RawDirectQuery,
}

/// Catalog read from a TOML or JSON file on every load.
///
/// ```toml
/// [[data_sources]]
/// id = "ds1"
/// title = "Data Source 1"
///
/// [[direct_query_connections]]
/// parent_id = "ds1"
/// name = "logs"
/// connector = "S3GLUE"
/// ```
#[derive(Debug, Clone)]
pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<CatalogDocument, LoadError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| LoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        let is_json = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&content).map_err(|e| LoadError::Decode(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| LoadError::Decode(e.to_string()))
        }
    }
}

impl CatalogLoader for FileCatalog {
    fn list_data_sources(&self) -> Result<Vec<RawDataSource>, LoadError> {
        Ok(self.read()?.data_sources)
    }

    fn fetch_direct_query_connections(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Connection>, LoadError> {
        Ok(self
            .read()?
            .direct_query_connections
            .into_iter()
            .filter(|dq| dq.parent_id == parent_id)
            .map(|dq| dq.connection.into_connection(&dq.parent_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_static_catalog_filters_children() {
        let catalog = StaticCatalog::new(vec![RawDataSource::new("ds1", "one")]).with_direct_query(
            vec![
                Connection::direct_query("a", "a", "ds1"),
                Connection::direct_query("b", "b", "ds2"),
            ],
        );

        let kids = catalog.fetch_direct_query_connections("ds1").unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].id, "a");
    }

    #[test]
    fn test_static_catalog_fails_single_parent() {
        let catalog = StaticCatalog::new(vec![
            RawDataSource::new("ds1", "one"),
            RawDataSource::new("ds2", "two"),
        ])
        .with_direct_query(vec![Connection::direct_query("b", "b", "ds2")])
        .failing_children_of("ds1");

        assert!(matches!(
            catalog.fetch_direct_query_connections("ds1"),
            Err(LoadError::Unreachable(_))
        ));
        assert_eq!(catalog.fetch_direct_query_connections("ds2").unwrap().len(), 1);
    }

    #[test]
    fn test_static_catalog_failure() {
        let catalog = StaticCatalog::default().failing();
        assert!(matches!(
            catalog.list_data_sources(),
            Err(LoadError::Unreachable(_))
        ));
    }

    #[test]
    fn test_file_catalog_toml() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[data_sources]]
id = "ds1"
title = "Data Source 1"

[[data_sources]]
id = "ds2"
title = "Data Source 2"

[[direct_query_connections]]
parent_id = "ds1"
name = "dqc1"
connector = "S3GLUE"
"#
        )
        .unwrap();

        let catalog = FileCatalog::new(file.path());
        let sources = catalog.list_data_sources().unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[1].title, "Data Source 2");

        let kids = catalog.fetch_direct_query_connections("ds1").unwrap();
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].id, "ds1-dqc1");
        assert_eq!(kids[0].engine, "Amazon S3");
    }

    #[test]
    fn test_file_catalog_json() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"data_sources": [{{"id": "ds1", "title": "one"}}]}}"#
        )
        .unwrap();

        let catalog = FileCatalog::new(file.path());
        assert_eq!(catalog.list_data_sources().unwrap()[0].id, "ds1");
        assert!(catalog
            .fetch_direct_query_connections("ds1")
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_file_catalog_missing_file() {
        let catalog = FileCatalog::new("/nonexistent/wsds/catalog.toml");
        assert!(matches!(
            catalog.list_data_sources(),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn test_file_catalog_malformed() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "data_sources = 3").unwrap();

        let catalog = FileCatalog::new(file.path());
        assert!(matches!(
            catalog.list_data_sources(),
            Err(LoadError::Decode(_))
        ));
    }
}
