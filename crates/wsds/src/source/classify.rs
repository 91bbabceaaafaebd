//! Split raw data source records into typed connection groups.

use super::connection::{Connection, RawDataSource, DEFAULT_ENGINE};

/// Output of [`classify`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// One entry per raw record, in input order
    pub open_search_connections: Vec<Connection>,
    /// Direct-query connections embedded in the raw records
    pub data_connections: Vec<Connection>,
}

/// Classify raw data sources.
///
/// Every record yields exactly one OpenSearch connection. Embedded
/// direct-query records become children of it, and their ids become the
/// parent's related connections.
pub fn classify(raw_data_sources: &[RawDataSource]) -> Classified {
    let mut out = Classified::default();

    for raw in raw_data_sources {
        let engine = if raw.data_source_engine_type.trim().is_empty() {
            DEFAULT_ENGINE.to_string()
        } else {
            raw.data_source_engine_type.clone()
        };

        let mut conn = Connection::open_search(raw.id.clone(), raw.title.clone()).with_engine(engine);
        if let Some(description) = raw.description.as_deref().filter(|d| !d.is_empty()) {
            conn = conn.with_description(description);
        }

        if let Some(children) = &raw.direct_query_connections {
            let children: Vec<Connection> = children
                .iter()
                .cloned()
                .map(|child| child.into_connection(&raw.id))
                .collect();
            conn = conn.with_related(children.iter().map(|c| c.id.clone()));
            out.data_connections.extend(children);
        }

        out.open_search_connections.push(conn);
    }

    out
}
