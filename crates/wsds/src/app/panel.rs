//! The data source panel: assigned table, association modal and the wiring
//! between loader, selection model and change sink.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::loading::{spawn_catalog_load, CatalogEvent};
use super::state::{LoadStatus, ModalMode, PanelTrigger};
use crate::selection::{ChangeSink, SelectionModel, SelectionState, Toggle};
use crate::source::{Catalog, CatalogLoader, Connection};
use crate::validation::FieldErrors;

pub struct DataSourcePanel<S: ChangeSink> {
    loader: Arc<dyn CatalogLoader>,
    rt: Handle,
    sink: S,
    /// Host-owned assigned set, as last passed in
    assigned: Vec<Connection>,
    errors: Option<FieldErrors>,
    show_data_source_management: bool,
    selection: SelectionModel,
    /// Direct-query children fetched by earlier loads, by parent id
    known_children: HashMap<String, Vec<Connection>>,
    modal: Option<ModalMode>,
    load_status: LoadStatus,
    load_error: Option<String>,
    generation: u64,
    events_tx: mpsc::UnboundedSender<CatalogEvent>,
    events_rx: mpsc::UnboundedReceiver<CatalogEvent>,
    /// Rows marked for removal, in marking order
    marked: Vec<String>,
}

impl<S: ChangeSink> DataSourcePanel<S> {
    pub fn new(
        loader: Arc<dyn CatalogLoader>,
        rt: Handle,
        sink: S,
        assigned: Vec<Connection>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            loader,
            rt,
            sink,
            assigned,
            errors: None,
            show_data_source_management: true,
            selection: SelectionModel::default(),
            known_children: HashMap::new(),
            modal: None,
            load_status: LoadStatus::Idle,
            load_error: None,
            generation: 0,
            events_tx,
            events_rx,
            marked: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Option<FieldErrors>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_data_source_management(mut self, show: bool) -> Self {
        self.show_data_source_management = show;
        self
    }

    /// Host passes a new assigned set. Removal marks on vanished rows drop.
    pub fn set_assigned(&mut self, assigned: Vec<Connection>) {
        self.marked.retain(|id| assigned.iter().any(|c| &c.id == id));
        self.assigned = assigned;
    }

    pub fn assigned(&self) -> &[Connection] {
        &self.assigned
    }

    pub fn set_errors(&mut self, errors: Option<FieldErrors>) {
        self.errors = errors;
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        self.errors.as_ref()
    }

    /// Message shown with the assigned table, if any.
    pub fn data_source_error(&self) -> Option<&str> {
        self.errors.as_ref().and_then(FieldErrors::data_sources)
    }

    pub fn show_data_source_management(&self) -> bool {
        self.show_data_source_management
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn catalog(&self) -> &Catalog {
        self.selection.catalog()
    }

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn modal_mode(&self) -> Option<ModalMode> {
        self.modal
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.selection.state() == SelectionState::Dirty
    }

    pub fn load_status(&self) -> LoadStatus {
        self.load_status
    }

    pub fn is_loading(&self) -> bool {
        self.load_status == LoadStatus::Loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Description shown at the top of the open modal.
    pub fn modal_description(&self) -> Option<&'static str> {
        self.modal.map(|m| m.description())
    }

    /// Open the association modal and start loading candidates.
    ///
    /// A second open supersedes a load still in flight.
    pub fn open_modal(&mut self, mode: ModalMode) {
        self.generation += 1;
        self.modal = Some(mode);
        self.selection.open(&self.assigned);
        self.load_status = LoadStatus::Loading;
        self.load_error = None;

        tracing::info!("opening {:?} association (load #{})", mode, self.generation);
        spawn_catalog_load(
            &self.rt,
            Arc::clone(&self.loader),
            self.generation,
            self.known_children.keys().cloned().collect(),
            self.events_tx.clone(),
        );
    }

    /// Close the modal, discarding the pending selection.
    pub fn close_modal(&mut self) {
        if self.modal.take().is_some() {
            self.selection.cancel();
        }
    }

    /// Candidates offered by the open modal, in catalog order.
    pub fn candidates(&self) -> Vec<&Connection> {
        match self.modal {
            Some(ModalMode::OpenSearch) => self.catalog().open_search().collect(),
            Some(ModalMode::DirectQuery) => self.catalog().direct_query().collect(),
            None => Vec::new(),
        }
    }

    pub fn is_candidate_selected(&self, id: &str) -> bool {
        self.selection.is_selected(id)
    }

    /// Flip a candidate in the modal. Disabled while loading.
    pub fn toggle(&mut self, candidate_id: &str) -> Toggle {
        if self.modal.is_none() || self.is_loading() {
            return Toggle::Ignored;
        }
        self.selection.toggle(candidate_id)
    }

    /// Commit the modal selection and notify the sink.
    ///
    /// Returns `None` when no modal is open or candidates are still loading.
    pub fn associate(&mut self) -> Option<Vec<Connection>> {
        if self.modal.is_none() || self.is_loading() {
            return None;
        }
        let result = self.selection.commit()?;
        self.modal = None;
        self.sink.on_change(&result);
        Some(result)
    }

    /// Mark or unmark an assigned row for removal.
    pub fn toggle_row_mark(&mut self, id: &str) -> bool {
        if let Some(pos) = self.marked.iter().position(|m| m == id) {
            self.marked.remove(pos);
            return true;
        }
        if self.assigned.iter().any(|c| c.id == id) {
            self.marked.push(id.to_string());
            return true;
        }
        false
    }

    pub fn is_row_marked(&self, id: &str) -> bool {
        self.marked.iter().any(|m| m == id)
    }

    pub fn marked_rows(&self) -> &[String] {
        &self.marked
    }

    /// Remove the marked rows (with cascade) and notify the sink.
    pub fn remove_selected(&mut self) -> Option<Vec<Connection>> {
        if self.marked.is_empty() {
            return None;
        }
        let ids: HashSet<String> = self.marked.drain(..).collect();
        Some(self.remove_assigned(&ids))
    }

    /// Remove `ids` from the assigned set directly, bypassing the modal.
    pub fn remove_assigned(&mut self, ids: &HashSet<String>) -> Vec<Connection> {
        let result = self.selection.remove_assigned(&self.assigned, ids);
        self.sink.on_change(&result);
        result
    }

    /// Drive an interaction point. Returns false if it is not available.
    pub fn activate(&mut self, trigger: PanelTrigger) -> bool {
        match trigger {
            PanelTrigger::Assign => {
                self.open_modal(ModalMode::OpenSearch);
                true
            }
            PanelTrigger::EmptyPromptAssign => {
                if !self.assigned.is_empty() {
                    return false;
                }
                self.open_modal(ModalMode::OpenSearch);
                true
            }
            PanelTrigger::EmptyPromptDirectQueryAssign => {
                if !self.assigned.is_empty() || !self.show_data_source_management {
                    return false;
                }
                self.open_modal(ModalMode::DirectQuery);
                true
            }
            PanelTrigger::RowCheckbox(id) => self.toggle_row_mark(&id),
            PanelTrigger::Associate => self.associate().is_some(),
            PanelTrigger::RemoveSelected => self.remove_selected().is_some(),
            PanelTrigger::Close => {
                let was_open = self.is_modal_open();
                self.close_modal();
                was_open
            }
        }
    }

    /// Drive an interaction point by its stable id, e.g.
    /// `checkboxSelectRow-ds1`. Unknown ids do nothing.
    pub fn activate_by_id(&mut self, test_id: &str) -> bool {
        match PanelTrigger::from_test_id(test_id) {
            Some(trigger) => self.activate(trigger),
            None => {
                tracing::debug!("no interaction point with id '{}'", test_id);
                false
            }
        }
    }

    /// Apply finished load steps without blocking. Returns the number applied.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            if self.apply_event(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait until the current load finishes.
    pub async fn settle(&mut self) {
        while self.is_loading() {
            match self.events_rx.recv().await {
                Some(event) => {
                    self.apply_event(event);
                }
                None => break,
            }
        }
    }

    fn apply_event(&mut self, event: CatalogEvent) -> bool {
        if event.generation() != self.generation {
            tracing::debug!(
                "dropping result of superseded load #{} (current #{})",
                event.generation(),
                self.generation
            );
            return false;
        }

        match event {
            CatalogEvent::Listed { mut catalog, .. } => {
                for (parent, children) in &self.known_children {
                    if catalog.contains(parent) {
                        catalog.merge_children(std::slice::from_ref(parent), children.clone());
                    }
                }
                self.selection.set_catalog(catalog);
            }
            CatalogEvent::ChildrenLoaded {
                parent_ids,
                children,
                errors,
                ..
            } => {
                for parent in &parent_ids {
                    let owned: Vec<Connection> = children
                        .iter()
                        .filter(|c| c.parent_id() == Some(parent.as_str()))
                        .cloned()
                        .collect();
                    self.known_children.insert(parent.clone(), owned);
                }
                self.selection
                    .catalog_mut()
                    .merge_children(&parent_ids, children);
                self.load_status = LoadStatus::Ready;
                if !errors.is_empty() {
                    self.load_error = Some(errors.join("; "));
                }
                tracing::debug!("catalog ready with {} connection(s)", self.catalog().len());
            }
            CatalogEvent::Failed { error, .. } => {
                self.load_status = LoadStatus::Failed;
                self.load_error = Some(error);
            }
        }
        true
    }
}
