//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Where candidate connections come from
    pub catalog: CatalogConfig,
    /// Panel behaviour
    pub panel: PanelConfig,
    /// Log output
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// OpenSearch Dashboards HTTP API
    #[default]
    Http,
    /// Local TOML or JSON file
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub source: CatalogSource,
    /// Dashboards base URL
    pub url: String,
    /// Catalog file, used when `source = "file"`
    pub file: Option<PathBuf>,
    /// Environment variable holding an `Authorization` header value
    pub auth_header_env: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: CatalogSource::Http,
            url: "http://localhost:5601".to_string(),
            file: None,
            auth_header_env: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Offer the direct-query assign button on the empty prompt
    pub show_data_source_management: bool,
    /// Flag the panel when no OpenSearch connection is assigned
    pub require_data_source: bool,
    /// Ask before removing rows
    pub confirm_removal: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            show_data_source_management: true,
            require_data_source: false,
            confirm_removal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when neither `WSDS_LOG` nor `RUST_LOG` is set
    pub level: String,
    /// Log file; defaults to `wsds.log` in the config directory
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
        }
    }
}
