//! Data source connections: records, classification, catalog and loaders.

mod catalog;
mod classify;
mod connection;
mod http;
mod loader;

pub use catalog::Catalog;
pub use classify::{classify, Classified};
pub use connection::{
    engine_for_connector, Connection, ConnectionKind, ConnectionType, RawDataSource,
    RawDirectQuery, DEFAULT_ENGINE,
};
pub use http::HttpCatalog;
pub use loader::{CatalogLoader, FileCatalog, LoadError, StaticCatalog};
