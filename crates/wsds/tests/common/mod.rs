//! Shared fixtures for panel integration tests.
//!
//! `ds1` and `ds2` are OpenSearch data sources. The related catalog also
//! gives `ds1` one direct-query child, `ds1-dqc1`.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::runtime::Handle;
use wsds::app::DataSourcePanel;
use wsds::selection::RecordingSink;
use wsds::source::{CatalogLoader, Connection, RawDataSource, StaticCatalog};

pub fn ds1() -> Connection {
    Connection::open_search("ds1", "Data Source 1")
}

pub fn ds2() -> Connection {
    Connection::open_search("ds2", "Data Source 2")
}

pub fn ds1_dqc1() -> Connection {
    Connection::direct_query("ds1-dqc1", "Direct Query 1", "ds1").with_engine("Amazon S3")
}

fn raw_data_sources() -> Vec<RawDataSource> {
    vec![
        RawDataSource::new("ds1", "Data Source 1"),
        RawDataSource::new("ds2", "Data Source 2"),
    ]
}

/// Two data sources, neither with children.
pub fn flat_catalog() -> StaticCatalog {
    StaticCatalog::new(raw_data_sources())
}

/// `ds1` owns `ds1-dqc1`.
pub fn related_catalog() -> StaticCatalog {
    StaticCatalog::new(raw_data_sources()).with_direct_query(vec![ds1_dqc1()])
}

pub fn panel(
    loader: impl CatalogLoader + 'static,
    assigned: Vec<Connection>,
) -> DataSourcePanel<RecordingSink> {
    DataSourcePanel::new(
        Arc::new(loader),
        Handle::current(),
        RecordingSink::default(),
        assigned,
    )
}

pub fn ids(conns: &[Connection]) -> Vec<&str> {
    conns.iter().map(|c| c.id.as_str()).collect()
}
