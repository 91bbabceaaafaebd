//! Background catalog loading.
//!
//! Each load is tagged with the generation of the `open` that started it so
//! the panel can drop results superseded by a later open.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::source::{classify, Catalog, CatalogLoader, Connection};

#[derive(Debug)]
pub enum CatalogEvent {
    Listed {
        generation: u64,
        catalog: Catalog,
    },
    /// Children of `parent_ids`. Parents whose fetch failed are left out and
    /// reported in `errors`.
    ChildrenLoaded {
        generation: u64,
        parent_ids: Vec<String>,
        children: Vec<Connection>,
        errors: Vec<String>,
    },
    /// Listing failed; no catalog for this generation.
    Failed { generation: u64, error: String },
}

impl CatalogEvent {
    pub fn generation(&self) -> u64 {
        match self {
            CatalogEvent::Listed { generation, .. }
            | CatalogEvent::ChildrenLoaded { generation, .. }
            | CatalogEvent::Failed { generation, .. } => *generation,
        }
    }
}

/// List data sources, then fetch children for parents not yet resolved.
///
/// `known_parents` holds parents whose children were fetched before.
pub fn spawn_catalog_load(
    rt: &Handle,
    loader: Arc<dyn CatalogLoader>,
    generation: u64,
    known_parents: HashSet<String>,
    tx: mpsc::UnboundedSender<CatalogEvent>,
) {
    rt.spawn_blocking(move || {
        tracing::debug!("catalog load #{} started", generation);

        let raw = match loader.list_data_sources() {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("catalog load #{} failed: {}", generation, e);
                let _ = tx.send(CatalogEvent::Failed {
                    generation,
                    error: e.to_string(),
                });
                return;
            }
        };

        let catalog = Catalog::from_classified(classify(&raw));
        let pending: Vec<String> = catalog
            .unresolved_parents()
            .into_iter()
            .filter(|id| !known_parents.contains(id))
            .collect();

        if tx
            .send(CatalogEvent::Listed {
                generation,
                catalog,
            })
            .is_err()
        {
            return;
        }

        let mut parent_ids = Vec::with_capacity(pending.len());
        let mut children = Vec::new();
        let mut errors = Vec::new();
        for parent_id in pending {
            match loader.fetch_direct_query_connections(&parent_id) {
                Ok(found) => {
                    children.extend(found);
                    parent_ids.push(parent_id);
                }
                Err(e) => {
                    tracing::warn!(
                        "direct query connections for '{}' unavailable: {}",
                        parent_id,
                        e
                    );
                    errors.push(format!("{}: {}", parent_id, e));
                }
            }
        }

        let _ = tx.send(CatalogEvent::ChildrenLoaded {
            generation,
            parent_ids,
            children,
            errors,
        });
    });
}
