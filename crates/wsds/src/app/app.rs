use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use super::panel::DataSourcePanel;
use super::state::PanelTrigger;
use crate::config::PanelConfig;
use crate::selection::ChannelSink;
use crate::source::{CatalogLoader, Connection};
use crate::ui::{
    assigned_rows, AssignedTable, AssociationModal, CandidateRow, ConfirmContext, ConfirmPrompt,
    ConfirmResult, ModalAction, ModalView, TableAction,
};
use crate::validation::validate_assigned;

/// Terminal host for the panel. Owns the assigned set and feeds every
/// change notification back into the panel.
pub struct App {
    panel: DataSourcePanel<ChannelSink>,
    changes_rx: mpsc::UnboundedReceiver<Vec<Connection>>,
    config: PanelConfig,
    table: AssignedTable,
    modal: AssociationModal,
    confirm: Option<ConfirmPrompt>,
    /// Last change summary for the status line
    last_change: Option<String>,
}

impl App {
    pub fn new(
        loader: Arc<dyn CatalogLoader>,
        rt: Handle,
        assigned: Vec<Connection>,
        config: PanelConfig,
    ) -> Self {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        let panel = DataSourcePanel::new(loader, rt, ChannelSink(changes_tx), assigned)
            .with_data_source_management(config.show_data_source_management);

        let mut app = Self {
            panel,
            changes_rx,
            config,
            table: AssignedTable::new(),
            modal: AssociationModal::new(),
            confirm: None,
            last_change: None,
        };
        app.revalidate();
        app
    }

    pub fn panel(&self) -> &DataSourcePanel<ChannelSink> {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut DataSourcePanel<ChannelSink> {
        &mut self.panel
    }

    pub fn assigned(&self) -> &[Connection] {
        self.panel.assigned()
    }

    pub fn into_assigned(self) -> Vec<Connection> {
        self.panel.assigned().to_vec()
    }

    pub fn is_confirming(&self) -> bool {
        self.confirm.is_some()
    }

    pub fn last_change(&self) -> Option<&str> {
        self.last_change.as_deref()
    }

    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            self.panel.drain_events();
            self.drain_changes();
            if self.panel.is_loading() {
                self.modal.tick();
            }

            terminal.draw(|frame| self.draw(frame))?;

            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if self.on_key(key) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.on_mouse(mouse),
                    _ => {}
                }
            }
        }

        Ok(())
    }

    /// Adopt every assigned set the panel reported since the last call.
    pub fn drain_changes(&mut self) {
        let mut latest = None;
        while let Ok(assigned) = self.changes_rx.try_recv() {
            latest = Some(assigned);
        }
        if let Some(assigned) = latest {
            self.last_change = Some(format!(
                "{} data source(s) associated",
                assigned.len()
            ));
            self.panel.set_assigned(assigned);
            self.revalidate();
        }
    }

    fn revalidate(&mut self) {
        let errors = validate_assigned(self.panel.assigned(), self.config.require_data_source);
        self.panel
            .set_errors(if errors.is_empty() { None } else { Some(errors) });
    }

    fn candidate_rows(&self) -> Vec<CandidateRow> {
        self.panel
            .candidates()
            .into_iter()
            .map(|c| {
                CandidateRow::new(c, self.panel.is_candidate_selected(&c.id))
                    .with_parent(self.panel.catalog())
            })
            .collect()
    }

    /// Returns true when the app should exit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if let Some(confirm) = self.confirm.as_mut() {
            let result = confirm.handle_key(key);
            self.resolve_confirm(result);
            return false;
        }

        if self.panel.is_modal_open() {
            let rows = self.candidate_rows();
            let action = self.modal.handle_key(key, &rows);
            self.apply_modal_action(action);
            return false;
        }

        let rows = assigned_rows(self.panel.assigned());
        let action = self
            .table
            .handle_key(key, &rows, self.panel.show_data_source_management());
        self.apply_table_action(action)
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) {
        if let Some(confirm) = self.confirm.as_mut() {
            let result = confirm.handle_mouse(mouse);
            self.resolve_confirm(result);
            return;
        }

        if self.panel.is_modal_open() {
            let rows = self.candidate_rows();
            let action = self.modal.handle_mouse(mouse, &rows);
            self.apply_modal_action(action);
            return;
        }

        let rows = assigned_rows(self.panel.assigned());
        let action = self.table.handle_mouse(mouse, &rows);
        self.apply_table_action(action);
    }

    fn apply_modal_action(&mut self, action: ModalAction) {
        match action {
            ModalAction::Continue => {}
            ModalAction::Toggle(id) => {
                self.panel.toggle(&id);
            }
            ModalAction::Associate => {
                if self.panel.activate(PanelTrigger::Associate) {
                    self.modal = AssociationModal::new();
                    self.drain_changes();
                }
            }
            ModalAction::Close => {
                if self.panel.is_dirty() {
                    self.confirm = Some(ConfirmPrompt::new(ConfirmContext::DiscardSelection));
                } else {
                    self.close_modal();
                }
            }
        }
    }

    fn apply_table_action(&mut self, action: TableAction) -> bool {
        match action {
            TableAction::Continue => {}
            TableAction::Quit => return true,
            TableAction::Open(trigger) => {
                if self.panel.activate(trigger) {
                    self.modal = AssociationModal::new();
                }
            }
            TableAction::ToggleMark(id) => {
                self.panel.activate(PanelTrigger::RowCheckbox(id));
            }
            TableAction::RemoveSelected => {
                let ids = self.panel.marked_rows().to_vec();
                if ids.is_empty() {
                    return false;
                }
                if self.config.confirm_removal {
                    self.confirm = Some(ConfirmPrompt::new(ConfirmContext::RemoveSelected { ids }));
                } else {
                    self.remove_marked();
                }
            }
        }
        false
    }

    fn resolve_confirm(&mut self, result: ConfirmResult) {
        let context = match result {
            ConfirmResult::Pending => return,
            ConfirmResult::Cancelled => {
                self.confirm = None;
                return;
            }
            ConfirmResult::Confirmed => match self.confirm.take() {
                Some(prompt) => prompt.context().clone(),
                None => return,
            },
        };

        match context {
            ConfirmContext::RemoveSelected { .. } => self.remove_marked(),
            ConfirmContext::DiscardSelection => self.close_modal(),
        }
    }

    fn remove_marked(&mut self) {
        if self.panel.activate(PanelTrigger::RemoveSelected) {
            self.drain_changes();
        }
    }

    fn close_modal(&mut self) {
        self.panel.activate(PanelTrigger::Close);
        self.modal = AssociationModal::new();
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

        let header = Line::from(vec![
            Span::styled(
                " Workspace data sources ",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" {} associated", self.panel.assigned().len()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        frame.render_widget(Paragraph::new(header), chunks[0]);

        let rows = assigned_rows(self.panel.assigned());
        let panel = &self.panel;
        let is_marked = |id: &str| panel.is_row_marked(id);
        self.table.render(
            frame,
            chunks[1],
            &rows,
            &is_marked,
            panel.show_data_source_management(),
            panel.data_source_error(),
        );

        let status = match (self.panel.load_status(), self.last_change.as_deref()) {
            (status, Some(change)) => format!(" {} | {}", status.label(), change),
            (status, None) => format!(" {}", status.label()),
        };
        frame.render_widget(
            Paragraph::new(Span::styled(status, Style::default().fg(Color::DarkGray))),
            chunks[2],
        );

        if let Some(mode) = self.panel.modal_mode() {
            let candidates = self.candidate_rows();
            let view = ModalView {
                mode,
                rows: &candidates,
                pending: self.panel.selection().selected_count(),
                loading: self.panel.is_loading(),
                error: self.panel.load_error(),
            };
            self.modal.render(frame, area, &view);
        }

        if let Some(confirm) = self.confirm.as_mut() {
            confirm.render(frame, area);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ModalMode;
    use crate::source::{RawDataSource, StaticCatalog};
    use crossterm::event::{KeyCode, KeyModifiers};
    use tokio::runtime::Runtime;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loader() -> Arc<dyn CatalogLoader> {
        Arc::new(
            StaticCatalog::new(vec![
                RawDataSource::new("ds1", "Data Source 1"),
                RawDataSource::new("ds2", "Data Source 2"),
            ])
            .with_direct_query(vec![Connection::direct_query(
                "ds1-dqc1",
                "Direct Query 1",
                "ds1",
            )]),
        )
    }

    fn app(rt: &Runtime, assigned: Vec<Connection>, config: PanelConfig) -> App {
        App::new(loader(), rt.handle().clone(), assigned, config)
    }

    fn ids(conns: &[Connection]) -> Vec<&str> {
        conns.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_associate_through_keys() {
        let rt = Runtime::new().unwrap();
        let mut app = app(&rt, Vec::new(), PanelConfig::default());

        assert!(!app.on_key(key(KeyCode::Char('a'))));
        assert_eq!(app.panel().modal_mode(), Some(ModalMode::OpenSearch));
        rt.block_on(app.panel_mut().settle());

        app.on_key(key(KeyCode::Char(' ')));
        app.on_key(key(KeyCode::Enter));

        assert!(!app.panel().is_modal_open());
        assert_eq!(ids(app.assigned()), vec!["ds1", "ds1-dqc1"]);
        assert_eq!(app.last_change(), Some("2 data source(s) associated"));
    }

    #[test]
    fn test_remove_with_confirmation() {
        let rt = Runtime::new().unwrap();
        let assigned = vec![
            Connection::open_search("ds1", "Data Source 1"),
            Connection::open_search("ds2", "Data Source 2"),
        ];
        let mut app = app(&rt, assigned, PanelConfig::default());

        app.on_key(key(KeyCode::Char('j')));
        app.on_key(key(KeyCode::Char(' ')));
        app.on_key(key(KeyCode::Char('x')));
        assert!(app.is_confirming());
        assert_eq!(app.assigned().len(), 2);

        app.on_key(key(KeyCode::Char('y')));
        assert!(!app.is_confirming());
        assert_eq!(ids(app.assigned()), vec!["ds1"]);
    }

    #[test]
    fn test_remove_without_confirmation() {
        let rt = Runtime::new().unwrap();
        let config = PanelConfig {
            confirm_removal: false,
            ..Default::default()
        };
        let mut app = app(&rt, vec![Connection::open_search("ds1", "Data Source 1")], config);

        app.on_key(key(KeyCode::Char(' ')));
        app.on_key(key(KeyCode::Delete));
        assert!(!app.is_confirming());
        assert!(app.assigned().is_empty());
    }

    #[test]
    fn test_close_dirty_modal_asks_first() {
        let rt = Runtime::new().unwrap();
        let mut app = app(&rt, Vec::new(), PanelConfig::default());

        app.on_key(key(KeyCode::Char('a')));
        rt.block_on(app.panel_mut().settle());
        app.on_key(key(KeyCode::Char(' ')));
        app.on_key(key(KeyCode::Esc));
        assert!(app.is_confirming());

        app.on_key(key(KeyCode::Char('n')));
        assert!(app.panel().is_modal_open());

        app.on_key(key(KeyCode::Esc));
        app.on_key(key(KeyCode::Char('y')));
        assert!(!app.panel().is_modal_open());
        assert!(app.assigned().is_empty());
    }

    #[test]
    fn test_required_data_source_error() {
        let rt = Runtime::new().unwrap();
        let config = PanelConfig {
            require_data_source: true,
            confirm_removal: false,
            ..Default::default()
        };
        let mut app = app(&rt, vec![Connection::open_search("ds1", "Data Source 1")], config);
        assert_eq!(app.panel().data_source_error(), None);

        app.on_key(key(KeyCode::Char(' ')));
        app.on_key(key(KeyCode::Char('x')));
        assert!(app.panel().data_source_error().is_some());
    }

    #[test]
    fn test_direct_query_rows_name_parent() {
        let rt = Runtime::new().unwrap();
        let mut app = app(&rt, Vec::new(), PanelConfig::default());

        app.panel_mut().open_modal(ModalMode::DirectQuery);
        rt.block_on(app.panel_mut().settle());

        let rows = app.candidate_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "ds1-dqc1");
        assert!(rows[0].detail.ends_with(" on Data Source 1"));
    }

    #[test]
    fn test_quit_key() {
        let rt = Runtime::new().unwrap();
        let mut app = app(&rt, Vec::new(), PanelConfig::default());
        assert!(app.on_key(key(KeyCode::Char('q'))));
    }
}
