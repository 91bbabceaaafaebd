//! The selection model behind the association modal.
//!
//! The host-owned assigned set and the modal's pending buffer are kept as
//! separate snapshots. `commit` merges the buffer into a new assigned set;
//! `cancel` drops it. `remove_assigned` works on the assigned set directly.

use std::collections::{HashMap, HashSet};

use super::expand::{dependents, expand, remove_cascading, ChildIndex};
use crate::source::{Catalog, Connection};

/// Outcome of [`SelectionModel::toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// The candidate joined the buffer.
    Added,
    /// The candidate left the buffer, taking `cascaded` children with it.
    Removed { cascaded: Vec<String> },
    /// Nothing open, or the id is not in the current catalog.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// No buffer.
    Closed,
    /// Buffer matches the assigned set it was seeded from.
    Open,
    /// Buffer differs from the seed.
    Dirty,
}

#[derive(Debug, Clone)]
struct Buffer {
    /// Assigned set at `open` time, ids unique
    initial: Vec<Connection>,
    initial_children: ChildIndex,
    /// Buffered ids mapped to the sequence number of the toggle that added them
    /// (0 for seeded entries)
    members: HashMap<String, u64>,
    /// Ids the user toggled off and has not toggled back on
    dropped: HashSet<String>,
    next_seq: u64,
}

impl Buffer {
    fn seed(assigned: &[Connection]) -> Self {
        let mut seen = HashSet::new();
        let initial: Vec<Connection> = assigned
            .iter()
            .filter(|c| seen.insert(c.id.clone()))
            .cloned()
            .collect();
        let members = initial.iter().map(|c| (c.id.clone(), 0)).collect();
        let initial_children = ChildIndex::build(&initial);

        Self {
            initial,
            initial_children,
            members,
            dropped: HashSet::new(),
            next_seq: 1,
        }
    }

    fn is_dirty(&self) -> bool {
        self.members.len() != self.initial.len()
            || self.initial.iter().any(|c| !self.members.contains_key(&c.id))
    }

    /// Ids toggled on during this session, in toggle order.
    fn toggled_on(&self) -> Vec<&str> {
        let mut ids: Vec<(&str, u64)> = self
            .members
            .iter()
            .filter(|(_, seq)| **seq > 0)
            .map(|(id, seq)| (id.as_str(), *seq))
            .collect();
        ids.sort_unstable_by_key(|(_, seq)| *seq);
        ids.into_iter().map(|(id, _)| id).collect()
    }
}

/// Pending selection against a catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    catalog: Catalog,
    buffer: Option<Buffer>,
}

impl SelectionModel {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            buffer: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Replace the catalog snapshot. An open buffer is kept.
    pub fn set_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Seed the buffer from `assigned`. Re-seeds if already open.
    pub fn open(&mut self, assigned: &[Connection]) {
        self.buffer = Some(Buffer::seed(assigned));
    }

    pub fn is_open(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn state(&self) -> SelectionState {
        match &self.buffer {
            None => SelectionState::Closed,
            Some(buffer) if buffer.is_dirty() => SelectionState::Dirty,
            Some(_) => SelectionState::Open,
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.buffer
            .as_ref()
            .is_some_and(|b| b.members.contains_key(id))
    }

    pub fn selected_count(&self) -> usize {
        self.buffer.as_ref().map_or(0, |b| b.members.len())
    }

    /// Flip `candidate_id` in the buffer.
    ///
    /// Removing an OpenSearch connection also removes its children.
    /// Adding never cascades; that happens on commit.
    pub fn toggle(&mut self, candidate_id: &str) -> Toggle {
        let Some(buffer) = self.buffer.as_mut() else {
            return Toggle::Ignored;
        };
        let Some(conn) = self.catalog.get(candidate_id) else {
            tracing::debug!("ignoring toggle of unknown candidate '{}'", candidate_id);
            return Toggle::Ignored;
        };

        if buffer.members.remove(candidate_id).is_some() {
            buffer.dropped.insert(candidate_id.to_string());
            let cascaded: Vec<String> = dependents(conn, &self.catalog, &buffer.initial_children)
                .into_iter()
                .filter(|id| buffer.members.remove(id).is_some())
                .collect();
            Toggle::Removed { cascaded }
        } else {
            let seq = buffer.next_seq;
            buffer.next_seq += 1;
            buffer.members.insert(candidate_id.to_string(), seq);
            buffer.dropped.remove(candidate_id);
            Toggle::Added
        }
    }

    /// Finalize the buffer into a new assigned set and close.
    ///
    /// Parents toggled on during this session bring their catalog children
    /// along, except children the user toggled off. Returns `None` when
    /// nothing is open.
    pub fn commit(&mut self) -> Option<Vec<Connection>> {
        let buffer = self.buffer.take()?;
        let merged = merge(&buffer, &self.catalog);
        let parents: HashSet<&str> = buffer.toggled_on().into_iter().collect();
        let result = expand(merged, &self.catalog, &parents, &buffer.dropped);
        tracing::info!(
            "associating {} connection(s) ({} before)",
            result.len(),
            buffer.initial.len()
        );
        Some(result)
    }

    /// Drop the buffer without producing a result.
    pub fn cancel(&mut self) {
        if self.buffer.take().is_some() {
            tracing::debug!("selection cancelled");
        }
    }

    /// Remove `ids` from `assigned` with cascade. Independent of the buffer.
    pub fn remove_assigned(&self, assigned: &[Connection], ids: &HashSet<String>) -> Vec<Connection> {
        let result = remove_cascading(assigned, ids, &self.catalog);
        tracing::info!(
            "removed {} connection(s) from the assigned set",
            assigned.len() - result.len()
        );
        result
    }
}

/// Seeded entries still buffered (original order), then additions in toggle
/// order. Additions missing from the catalog are dropped.
fn merge(buffer: &Buffer, catalog: &Catalog) -> Vec<Connection> {
    let mut out: Vec<Connection> = buffer
        .initial
        .iter()
        .filter(|c| buffer.members.contains_key(&c.id))
        .cloned()
        .collect();
    let initial_ids: HashSet<&str> = buffer.initial.iter().map(|c| c.id.as_str()).collect();

    for id in buffer.toggled_on() {
        if initial_ids.contains(id) {
            continue;
        }
        if let Some(conn) = catalog.get(id) {
            out.push(conn.clone());
        }
    }

    out
}
