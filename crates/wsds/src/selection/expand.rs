//! Parent/child cascade rules.
//!
//! Newly associating an OpenSearch connection brings its direct-query
//! children along; removing it takes them away. Removing a child never touches the
//! parent, and orphans never cascade.

use std::collections::{HashMap, HashSet};

use crate::source::{Catalog, Connection, ConnectionKind};

/// Parent id to child ids, built from an assigned set.
#[derive(Debug, Clone, Default)]
pub struct ChildIndex(HashMap<String, Vec<String>>);

impl ChildIndex {
    pub fn build(assigned: &[Connection]) -> Self {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for conn in assigned {
            if let Some(parent) = conn.parent_id() {
                map.entry(parent.to_string())
                    .or_default()
                    .push(conn.id.clone());
            }
        }
        Self(map)
    }

    pub fn get(&self, parent_id: &str) -> &[String] {
        self.0.get(parent_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Ids that go away together with `conn`.
///
/// Children come from the catalog relation and from the `assigned`
/// entries pointing at `conn`.
pub fn dependents(conn: &Connection, catalog: &Catalog, assigned: &ChildIndex) -> Vec<String> {
    match &conn.kind {
        ConnectionKind::OpenSearch { .. } => {
            let mut ids: Vec<String> = catalog.children_of(&conn.id).map(|c| c.id.clone()).collect();
            for id in assigned.get(&conn.id) {
                if !ids.contains(id) {
                    ids.push(id.clone());
                }
            }
            ids
        }
        ConnectionKind::DirectQuery { .. } => Vec::new(),
    }
}

/// Bring the catalog children of `parents` into `selected`.
///
/// Each OpenSearch connection listed in `parents` is followed by its catalog
/// children that are neither selected already nor in `excluded`. Existing
/// entries keep their order.
pub fn expand(
    selected: Vec<Connection>,
    catalog: &Catalog,
    parents: &HashSet<&str>,
    excluded: &HashSet<String>,
) -> Vec<Connection> {
    let mut seen: HashSet<String> = selected.iter().map(|c| c.id.clone()).collect();
    let mut out = Vec::with_capacity(selected.len());

    for conn in selected {
        let children: Vec<Connection> = match &conn.kind {
            ConnectionKind::OpenSearch { .. } if parents.contains(conn.id.as_str()) => catalog
                .children_of(&conn.id)
                .filter(|child| !seen.contains(&child.id) && !excluded.contains(&child.id))
                .cloned()
                .collect(),
            ConnectionKind::OpenSearch { .. } => Vec::new(),
            ConnectionKind::DirectQuery { .. } => Vec::new(),
        };

        out.push(conn);
        for child in children {
            seen.insert(child.id.clone());
            out.push(child);
        }
    }

    out
}

/// Remove `ids` from `assigned`, cascading to the children of removed
/// OpenSearch connections.
pub fn remove_cascading(
    assigned: &[Connection],
    ids: &HashSet<String>,
    catalog: &Catalog,
) -> Vec<Connection> {
    let index = ChildIndex::build(assigned);
    let mut doomed: HashSet<String> = ids.clone();

    for id in ids {
        let conn = assigned
            .iter()
            .find(|c| &c.id == id)
            .or_else(|| catalog.get(id));
        if let Some(conn) = conn {
            doomed.extend(dependents(conn, catalog, &index));
        }
    }

    assigned
        .iter()
        .filter(|c| !doomed.contains(&c.id))
        .cloned()
        .collect()
}
