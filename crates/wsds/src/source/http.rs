//! Catalog loader backed by the OpenSearch Dashboards HTTP API.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use url::Url;

use super::connection::{Connection, RawDataSource, RawDirectQuery};
use super::loader::{CatalogLoader, LoadError};

/// Saved objects page size; dashboards caps `_find` at 10k.
const PER_PAGE: &str = "10000";

#[derive(Debug, Deserialize)]
struct FindResponse {
    #[serde(default)]
    saved_objects: Vec<SavedObject>,
}

#[derive(Debug, Deserialize)]
struct SavedObject {
    id: String,
    #[serde(default)]
    attributes: SavedAttributes,
    #[serde(default)]
    workspaces: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SavedAttributes {
    title: String,
    description: Option<String>,
    data_source_engine_type: String,
}

impl From<SavedObject> for RawDataSource {
    fn from(obj: SavedObject) -> Self {
        RawDataSource {
            id: obj.id,
            title: obj.attributes.title,
            description: obj.attributes.description,
            data_source_engine_type: obj.attributes.data_source_engine_type,
            workspaces: obj.workspaces,
            direct_query_connections: None,
        }
    }
}

/// Blocking client for the dashboards saved objects and direct-query APIs.
pub struct HttpCatalog {
    base: Url,
    agent: ureq::Agent,
    authorization: Option<String>,
}

impl HttpCatalog {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LoadError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        Ok(Self {
            base,
            agent,
            authorization: None,
        })
    }

    /// Send `value` as the `Authorization` header on every request.
    pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
        self.authorization = Some(value.into());
        self
    }

    fn find_url(&self) -> Result<Url, LoadError> {
        let mut url = self.base.join("api/saved_objects/_find")?;
        url.query_pairs_mut()
            .append_pair("type", "data-source")
            .append_pair("per_page", PER_PAGE);
        Ok(url)
    }

    fn direct_query_url(&self, parent_id: &str) -> Result<Url, LoadError> {
        let encoded = utf8_percent_encode(parent_id, NON_ALPHANUMERIC);
        let path = format!("api/directquery/dataconnections/dataSourceMDSId={}", encoded);
        Ok(self.base.join(&path)?)
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &Url) -> Result<T, LoadError> {
        let mut request = self.agent.get(url.as_str()).set("osd-xsrf", "true");
        if let Some(auth) = &self.authorization {
            request = request.set("Authorization", auth);
        }

        let response = request.call().map_err(|e| match e {
            ureq::Error::Status(status, _) => LoadError::Status {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(t) => LoadError::Unreachable(t.to_string()),
        })?;

        response
            .into_json::<T>()
            .map_err(|e| LoadError::Decode(e.to_string()))
    }
}

impl CatalogLoader for HttpCatalog {
    fn list_data_sources(&self) -> Result<Vec<RawDataSource>, LoadError> {
        let url = self.find_url()?;
        tracing::debug!("listing data sources from {}", url);
        let page: FindResponse = self.get_json(&url)?;
        Ok(page.saved_objects.into_iter().map(Into::into).collect())
    }

    fn fetch_direct_query_connections(
        &self,
        parent_id: &str,
    ) -> Result<Vec<Connection>, LoadError> {
        let url = self.direct_query_url(parent_id)?;
        let records: Vec<RawDirectQuery> = self.get_json(&url)?;
        tracing::debug!(
            "data source '{}' has {} direct query connection(s)",
            parent_id,
            records.len()
        );
        Ok(records
            .into_iter()
            .map(|r| r.into_connection(parent_id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(base: &str) -> HttpCatalog {
        HttpCatalog::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_find_url() {
        let url = catalog("http://localhost:5601").find_url().unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5601/api/saved_objects/_find?type=data-source&per_page=10000"
        );
    }

    #[test]
    fn test_find_url_keeps_base_path() {
        let url = catalog("https://dash.example.com/base").find_url().unwrap();
        assert!(url
            .as_str()
            .starts_with("https://dash.example.com/base/api/saved_objects/_find"));
    }

    #[test]
    fn test_direct_query_url_encodes_id() {
        let url = catalog("http://localhost:5601")
            .direct_query_url("a b/c")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5601/api/directquery/dataconnections/dataSourceMDSId=a%20b%2Fc"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpCatalog::new("not a url", Duration::from_secs(1)),
            Err(LoadError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_saved_object_conversion() {
        let json = r#"{
            "saved_objects": [{
                "id": "ds1",
                "attributes": {"title": "Data Source 1", "dataSourceEngineType": "OpenSearch"},
                "workspaces": ["w1"]
            }]
        }"#;
        let page: FindResponse = serde_json::from_str(json).unwrap();
        let raw: Vec<RawDataSource> = page.saved_objects.into_iter().map(Into::into).collect();

        assert_eq!(raw[0].id, "ds1");
        assert_eq!(raw[0].title, "Data Source 1");
        assert_eq!(raw[0].workspaces, vec!["w1".to_string()]);
    }

    #[test]
    fn test_unreachable_service() {
        let catalog = HttpCatalog::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        assert!(matches!(
            catalog.list_data_sources(),
            Err(LoadError::Unreachable(_))
        ));
        assert!(matches!(
            catalog.fetch_direct_query_connections("ds1"),
            Err(LoadError::Unreachable(_))
        ));
    }
}
