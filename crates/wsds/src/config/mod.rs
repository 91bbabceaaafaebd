//! Configuration module for wsds.
//!
//! Handles loading configuration from:
//! - Default values
//! - Config file (~/.config/wsds/config.toml)
//! - Environment variables (config dir, catalog authorization)

mod schema;

pub use schema::{CatalogConfig, CatalogSource, Config, LoggingConfig, PanelConfig};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::source::{CatalogLoader, FileCatalog, HttpCatalog};

/// Returns the config directory path.
///
/// Checks `WSDS_CONFIG_DIR` environment variable first, then falls back
/// to the system default (~/.config/wsds on Linux/macOS).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("WSDS_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|p| p.join("wsds"))
}

/// Returns the default config file path (~/.config/wsds/config.toml)
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Returns the default log file path (~/.config/wsds/wsds.log)
pub fn log_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join("wsds.log"))
}

/// Load configuration from the default path or return defaults
pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

/// Load configuration from a specific path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

/// Build the catalog loader selected by `[catalog]`.
pub fn build_loader(catalog: &CatalogConfig) -> Result<Arc<dyn CatalogLoader>> {
    match catalog.source {
        CatalogSource::File => {
            let Some(file) = &catalog.file else {
                bail!("catalog source is \"file\" but no catalog.file is configured");
            };
            tracing::info!("using catalog file {}", file.display());
            Ok(Arc::new(FileCatalog::new(file)))
        }
        CatalogSource::Http => {
            let timeout = Duration::from_secs(catalog.timeout_secs);
            let mut client = HttpCatalog::new(&catalog.url, timeout)
                .with_context(|| format!("Invalid catalog url: {}", catalog.url))?;

            if let Some(var) = &catalog.auth_header_env {
                match std::env::var(var) {
                    Ok(value) => client = client.with_authorization(value),
                    Err(_) => tracing::warn!("{} is not set, sending no authorization", var),
                }
            }
            tracing::info!("using catalog service at {}", catalog.url);
            Ok(Arc::new(client))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.catalog.source, CatalogSource::Http);
        assert!(config.panel.show_data_source_management);
        assert!(!config.panel.require_data_source);
        assert!(config.panel.confirm_removal);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_config_paths() {
        if let (Some(dir), Some(cfg), Some(log)) = (config_dir(), config_path(), log_path()) {
            assert!(cfg.starts_with(&dir));
            assert!(log.starts_with(&dir));
            assert!(cfg.ends_with("config.toml"));
            assert!(log.ends_with("wsds.log"));
        }
    }

    #[test]
    #[serial]
    fn test_config_dir_env_override() {
        let dir = TempDir::new().unwrap();
        let previous = std::env::var_os("WSDS_CONFIG_DIR");
        std::env::set_var("WSDS_CONFIG_DIR", dir.path());

        assert_eq!(config_dir(), Some(dir.path().to_path_buf()));
        assert_eq!(config_path(), Some(dir.path().join("config.toml")));
        // No file yet: defaults.
        assert_eq!(load_config().unwrap(), Config::default());

        std::fs::write(
            dir.path().join("config.toml"),
            "[panel]\nrequire_data_source = true\n",
        )
        .unwrap();
        assert!(load_config().unwrap().panel.require_data_source);

        match previous {
            Some(v) => std::env::set_var("WSDS_CONFIG_DIR", v),
            None => std::env::remove_var("WSDS_CONFIG_DIR"),
        }
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[catalog]
source = "file"
file = "/tmp/catalog.toml"

[panel]
show_data_source_management = false
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.catalog.source, CatalogSource::File);
        assert_eq!(config.catalog.file, Some(PathBuf::from("/tmp/catalog.toml")));
        assert!(!config.panel.show_data_source_management);
        // Other fields should be default
        assert!(config.panel.confirm_removal);
        assert_eq!(config.catalog.timeout_secs, 30);
    }

    #[test]
    fn test_malformed_config_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[panel\n").unwrap();

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_build_loader_requires_file() {
        let catalog = CatalogConfig {
            source: CatalogSource::File,
            ..Default::default()
        };
        assert!(build_loader(&catalog).is_err());
    }

    #[test]
    fn test_build_loader_rejects_bad_url() {
        let catalog = CatalogConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(build_loader(&catalog).is_err());
    }

    #[test]
    fn test_build_loader_http_default() {
        assert!(build_loader(&CatalogConfig::default()).is_ok());
    }
}
