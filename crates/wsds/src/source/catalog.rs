//! Catalog snapshot with a parent/child relation index.
//!
//! Connections live in a flat vector. Relations are index pairs: parent
//! index to ordered child indices, and child index to parent index.

use std::collections::HashMap;

use super::classify::Classified;
use super::connection::{Connection, ConnectionKind};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    connections: Vec<Connection>,
    index: HashMap<String, usize>,
    children: HashMap<usize, Vec<usize>>,
    parent: HashMap<usize, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from classifier output (OpenSearch connections first).
    pub fn from_classified(classified: Classified) -> Self {
        let mut catalog = Self::new();
        for conn in classified
            .open_search_connections
            .into_iter()
            .chain(classified.data_connections)
        {
            catalog.push(conn);
        }
        catalog.relink();
        catalog
    }

    pub fn from_connections(connections: impl IntoIterator<Item = Connection>) -> Self {
        let mut catalog = Self::new();
        for conn in connections {
            catalog.push(conn);
        }
        catalog.relink();
        catalog
    }

    /// Add fetched direct-query children and mark `parent_ids` as resolved.
    ///
    /// Children already present (by id) are kept as they are.
    pub fn merge_children(&mut self, parent_ids: &[String], children: Vec<Connection>) {
        for child in children {
            self.push(child);
        }

        for parent_id in parent_ids {
            let Some(&idx) = self.index.get(parent_id) else {
                continue;
            };
            let ids: Vec<String> = self
                .connections
                .iter()
                .filter(|c| c.parent_id() == Some(parent_id.as_str()))
                .map(|c| c.id.clone())
                .collect();

            if let ConnectionKind::OpenSearch {
                related_connections,
            } = &mut self.connections[idx].kind
            {
                let mut merged = related_connections.take().unwrap_or_default();
                for id in ids {
                    if !merged.contains(&id) {
                        merged.push(id);
                    }
                }
                *related_connections = Some(merged);
            }
        }

        self.relink();
    }

    fn push(&mut self, conn: Connection) -> bool {
        if self.index.contains_key(&conn.id) {
            tracing::debug!("catalog already holds connection '{}', skipping", conn.id);
            return false;
        }
        self.index.insert(conn.id.clone(), self.connections.len());
        self.connections.push(conn);
        true
    }

    fn relink(&mut self) {
        self.children.clear();
        self.parent.clear();

        for (idx, conn) in self.connections.iter().enumerate() {
            let ConnectionKind::OpenSearch {
                related_connections,
            } = &conn.kind
            else {
                continue;
            };

            let mut kids: Vec<usize> = Vec::new();
            for id in related_connections.iter().flatten() {
                if let Some(&child) = self.index.get(id) {
                    if !self.connections[child].is_open_search() && !kids.contains(&child) {
                        kids.push(child);
                    }
                }
            }
            for (child, candidate) in self.connections.iter().enumerate() {
                if candidate.parent_id() == Some(conn.id.as_str()) && !kids.contains(&child) {
                    kids.push(child);
                }
            }

            for &child in &kids {
                self.parent.entry(child).or_insert(idx);
            }
            if !kids.is_empty() {
                self.children.insert(idx, kids);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Connection> {
        self.index.get(id).map(|&idx| &self.connections[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    pub fn open_search(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(|c| c.is_open_search())
    }

    pub fn direct_query(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(|c| !c.is_open_search())
    }

    /// Direct-query children of `id`, in catalog order.
    pub fn children_of(&self, id: &str) -> impl Iterator<Item = &Connection> {
        self.index
            .get(id)
            .and_then(|idx| self.children.get(idx))
            .into_iter()
            .flatten()
            .map(|&child| &self.connections[child])
    }

    pub fn parent_of(&self, id: &str) -> Option<&Connection> {
        let idx = self.index.get(id)?;
        self.parent.get(idx).map(|&p| &self.connections[p])
    }

    /// True for a direct-query connection whose parent is not in the catalog.
    pub fn is_orphan(&self, id: &str) -> bool {
        match self.get(id) {
            Some(conn) => !conn.is_open_search() && self.parent_of(id).is_none(),
            None => false,
        }
    }

    /// OpenSearch connections whose children have not been resolved.
    pub fn unresolved_parents(&self) -> Vec<String> {
        self.open_search()
            .filter(|c| c.related_ids().is_none())
            .map(|c| c.id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::from_connections(vec![
            Connection::open_search("ds1", "Data Source 1").with_related(["ds1-dqc1"]),
            Connection::open_search("ds2", "Data Source 2"),
            Connection::direct_query("ds1-dqc1", "dqc1", "ds1").with_engine("Amazon S3"),
            Connection::direct_query("ds1-dqc2", "dqc2", "ds1"),
            Connection::direct_query("lost", "lost", "ds9"),
        ])
    }

    #[test]
    fn test_children_in_catalog_order() {
        let catalog = sample();
        let kids: Vec<&str> = catalog.children_of("ds1").map(|c| c.id.as_str()).collect();

        assert_eq!(kids, vec!["ds1-dqc1", "ds1-dqc2"]);
        assert_eq!(catalog.children_of("ds2").count(), 0);
        assert_eq!(catalog.children_of("missing").count(), 0);
    }

    #[test]
    fn test_related_order_wins_over_position() {
        let catalog = Catalog::from_connections(vec![
            Connection::direct_query("a", "a", "p"),
            Connection::direct_query("b", "b", "p"),
            Connection::open_search("p", "p").with_related(["b", "a"]),
        ]);
        let kids: Vec<&str> = catalog.children_of("p").map(|c| c.id.as_str()).collect();
        assert_eq!(kids, vec!["b", "a"]);
    }

    #[test]
    fn test_parent_lookup_and_orphans() {
        let catalog = sample();

        assert_eq!(catalog.parent_of("ds1-dqc2").map(|c| c.id.as_str()), Some("ds1"));
        assert!(catalog.parent_of("ds1").is_none());
        assert!(catalog.is_orphan("lost"));
        assert!(!catalog.is_orphan("ds1-dqc1"));
        assert!(!catalog.is_orphan("ds1"));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = Catalog::from_connections(vec![
            Connection::open_search("ds1", "first"),
            Connection::open_search("ds1", "second"),
        ]);

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("ds1").unwrap().name, "first");
    }

    #[test]
    fn test_unresolved_parents() {
        let catalog = sample();
        assert_eq!(catalog.unresolved_parents(), vec!["ds2".to_string()]);
    }

    #[test]
    fn test_merge_children_resolves_parents() {
        let mut catalog = sample();
        catalog.merge_children(
            &["ds2".to_string()],
            vec![Connection::direct_query("ds2-logs", "logs", "ds2")],
        );

        assert!(catalog.unresolved_parents().is_empty());
        assert_eq!(
            catalog.get("ds2").unwrap().related_ids().unwrap(),
            &["ds2-logs".to_string()]
        );
        assert_eq!(
            catalog.parent_of("ds2-logs").map(|c| c.id.as_str()),
            Some("ds2")
        );
    }

    #[test]
    fn test_merge_children_with_nothing_found() {
        let mut catalog = sample();
        catalog.merge_children(&["ds2".to_string()], Vec::new());

        assert_eq!(catalog.get("ds2").unwrap().related_ids(), Some(&[][..]));
    }

    #[test]
    fn test_from_classified_puts_parents_first() {
        let classified = Classified {
            open_search_connections: vec![Connection::open_search("p", "p")],
            data_connections: vec![Connection::direct_query("c", "c", "p")],
        };
        let catalog = Catalog::from_classified(classified);

        assert_eq!(catalog.iter().next().unwrap().id, "p");
        assert_eq!(catalog.open_search().count(), 1);
        assert_eq!(catalog.direct_query().count(), 1);
    }
}
