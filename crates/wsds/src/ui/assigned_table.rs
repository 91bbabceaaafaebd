//! Table of connections assigned to the workspace.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;

use super::{is_inside, truncate_to_width};
use crate::app::{ModalMode, PanelTrigger};
use crate::source::Connection;

pub const EMPTY_PROMPT: &str = "Associated data sources will appear here";

/// One table line. Direct-query children sit under their assigned parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedRow {
    pub id: String,
    pub name: String,
    pub kind: &'static str,
    pub engine: String,
    pub nested: bool,
}

/// Parent rows in assigned order, each followed by its assigned children.
/// Children whose parent is not assigned are listed on their own.
pub fn assigned_rows(assigned: &[Connection]) -> Vec<AssignedRow> {
    let row = |c: &Connection, nested: bool| AssignedRow {
        id: c.id.clone(),
        name: c.name.clone(),
        kind: c.connection_type().label(),
        engine: c.engine.clone(),
        nested,
    };

    let is_assigned = |id: &str| assigned.iter().any(|c| c.id == id);
    let mut rows = Vec::with_capacity(assigned.len());
    for conn in assigned {
        match conn.parent_id() {
            Some(parent) if is_assigned(parent) => continue,
            _ => rows.push(row(conn, false)),
        }
        if conn.is_open_search() {
            rows.extend(
                assigned
                    .iter()
                    .filter(|c| c.parent_id() == Some(conn.id.as_str()))
                    .map(|c| row(c, true)),
            );
        }
    }
    rows
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    Continue,
    Quit,
    Open(PanelTrigger),
    ToggleMark(String),
    RemoveSelected,
}

#[derive(Default)]
pub struct AssignedTable {
    cursor: usize,
    scroll_offset: usize,
    visible_height: usize,
    body_area: Option<Rect>,
    empty_buttons: Vec<(Rect, PanelTrigger)>,
}

impl AssignedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Trigger for the assign shortcut in the current state of the table.
    fn assign_trigger(rows: &[AssignedRow], mode: ModalMode, show_dqc: bool) -> Option<PanelTrigger> {
        match (mode, rows.is_empty()) {
            (ModalMode::OpenSearch, false) => Some(PanelTrigger::Assign),
            (ModalMode::OpenSearch, true) => Some(PanelTrigger::EmptyPromptAssign),
            (ModalMode::DirectQuery, true) if show_dqc => {
                Some(PanelTrigger::EmptyPromptDirectQueryAssign)
            }
            (ModalMode::DirectQuery, _) => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, rows: &[AssignedRow], show_dqc: bool) -> TableAction {
        self.clamp(rows.len());

        match (key.code, key.modifiers) {
            (KeyCode::Char('q'), KeyModifiers::NONE)
            | (KeyCode::Char('c'), KeyModifiers::CONTROL) => TableAction::Quit,

            (KeyCode::Up, _) | (KeyCode::Char('k'), KeyModifiers::NONE) => {
                self.cursor = self.cursor.saturating_sub(1);
                TableAction::Continue
            }
            (KeyCode::Down, _) | (KeyCode::Char('j'), KeyModifiers::NONE) => {
                if self.cursor + 1 < rows.len() {
                    self.cursor += 1;
                }
                TableAction::Continue
            }
            (KeyCode::Home, _) | (KeyCode::Char('g'), KeyModifiers::NONE) => {
                self.cursor = 0;
                TableAction::Continue
            }
            (KeyCode::End, _) | (KeyCode::Char('G'), KeyModifiers::SHIFT) => {
                self.cursor = rows.len().saturating_sub(1);
                TableAction::Continue
            }

            (KeyCode::Char(' '), _) => match rows.get(self.cursor) {
                Some(row) => TableAction::ToggleMark(row.id.clone()),
                None => TableAction::Continue,
            },

            (KeyCode::Char('a'), KeyModifiers::NONE) => {
                Self::assign_trigger(rows, ModalMode::OpenSearch, show_dqc)
                    .map(TableAction::Open)
                    .unwrap_or(TableAction::Continue)
            }
            (KeyCode::Char('d'), KeyModifiers::NONE) => {
                Self::assign_trigger(rows, ModalMode::DirectQuery, show_dqc)
                    .map(TableAction::Open)
                    .unwrap_or(TableAction::Continue)
            }

            (KeyCode::Char('x'), KeyModifiers::NONE) | (KeyCode::Delete, _) => {
                TableAction::RemoveSelected
            }

            _ => TableAction::Continue,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, rows: &[AssignedRow]) -> TableAction {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return TableAction::Continue;
        }
        let (x, y) = (mouse.column, mouse.row);

        if let Some((_, trigger)) = self
            .empty_buttons
            .iter()
            .find(|(area, _)| is_inside(x, y, *area))
        {
            return TableAction::Open(trigger.clone());
        }

        if let Some(body) = self.body_area {
            if is_inside(x, y, body) {
                let index = self.scroll_offset + (y - body.y) as usize;
                if let Some(row) = rows.get(index) {
                    self.cursor = index;
                    return TableAction::ToggleMark(row.id.clone());
                }
            }
        }
        TableAction::Continue
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn ensure_cursor_visible(&mut self) {
        if self.visible_height == 0 {
            return;
        }
        if self.cursor < self.scroll_offset {
            self.scroll_offset = self.cursor;
        }
        if self.cursor >= self.scroll_offset + self.visible_height {
            self.scroll_offset = self.cursor - self.visible_height + 1;
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        rows: &[AssignedRow],
        is_marked: &dyn Fn(&str) -> bool,
        show_dqc: bool,
        error: Option<&str>,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Associated data sources ")
            .border_style(Style::default().fg(if error.is_some() {
                Color::Red
            } else {
                Color::DarkGray
            }));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(if error.is_some() { 1 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(inner);

        self.empty_buttons.clear();
        if rows.is_empty() {
            self.body_area = None;
            self.render_empty(frame, chunks[0], show_dqc);
        } else {
            self.render_rows(frame, chunks[0], rows, is_marked);
        }

        if let Some(error) = error {
            let line = Line::from(Span::styled(error.to_string(), Style::default().fg(Color::Red)));
            frame.render_widget(Paragraph::new(line), chunks[1]);
        }

        let mut help = vec![
            Span::styled("[a]", Style::default().fg(Color::Yellow)),
            Span::raw(" associate "),
        ];
        if show_dqc && rows.is_empty() {
            help.push(Span::styled("[d]", Style::default().fg(Color::Yellow)));
            help.push(Span::raw(" direct query "));
        }
        help.extend([
            Span::styled("[Space]", Style::default().fg(Color::Yellow)),
            Span::raw(" mark "),
            Span::styled("[x]", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" {} ", PanelTrigger::RemoveSelected.label().to_lowercase())),
            Span::styled("[q]", Style::default().fg(Color::Yellow)),
            Span::raw(" done"),
        ]);
        frame.render_widget(Paragraph::new(Line::from(help)), chunks[2]);
    }

    fn render_empty(&mut self, frame: &mut Frame, area: Rect, show_dqc: bool) {
        let prompt_height = if show_dqc { 4 } else { 3 };
        let top = area.y + area.height.saturating_sub(prompt_height) / 2;
        let line_at = |offset: u16| Rect {
            x: area.x,
            y: (top + offset).min(area.y + area.height.saturating_sub(1)),
            width: area.width,
            height: 1,
        };

        let prompt = Paragraph::new(Line::from(Span::styled(
            EMPTY_PROMPT,
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(prompt, line_at(0));

        let mut buttons = vec![PanelTrigger::EmptyPromptAssign];
        if show_dqc {
            buttons.push(PanelTrigger::EmptyPromptDirectQueryAssign);
        }
        for (i, trigger) in buttons.into_iter().enumerate() {
            let label = format!("[ {} ]", trigger.label());
            let width = (label.chars().count() as u16).min(area.width);
            let line = line_at(2 + i as u16);
            let button = Rect {
                x: line.x + line.width.saturating_sub(width) / 2,
                width,
                ..line
            };
            frame.render_widget(
                Paragraph::new(Span::styled(
                    label,
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )),
                button,
            );
            self.empty_buttons.push((button, trigger));
        }
    }

    fn render_rows(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        rows: &[AssignedRow],
        is_marked: &dyn Fn(&str) -> bool,
    ) {
        self.clamp(rows.len());

        let header_height = 1;
        self.visible_height = area.height.saturating_sub(header_height) as usize;
        self.body_area = Some(Rect {
            y: area.y + header_height,
            height: area.height.saturating_sub(header_height),
            ..area
        });
        self.ensure_cursor_visible();

        let name_width = (area.width as usize).saturating_sub(40).max(12);
        let header = Row::new(vec!["", "Name", "Type", "Engine"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let body: Vec<Row> = rows
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.visible_height)
            .map(|(i, row)| {
                let mark = if is_marked(&row.id) { "[x]" } else { "[ ]" };
                let name = if row.nested {
                    format!("  └ {}", row.name)
                } else {
                    row.name.clone()
                };
                let style = if i == self.cursor {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(mark),
                    Cell::from(truncate_to_width(&name, name_width)),
                    Cell::from(row.kind),
                    Cell::from(row.engine.clone()),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            body,
            [
                Constraint::Length(4),
                Constraint::Min(12),
                Constraint::Length(22),
                Constraint::Length(14),
            ],
        )
        .header(header);
        frame.render_widget(table, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn assigned() -> Vec<Connection> {
        vec![
            Connection::direct_query("orphan-dq", "Orphan", "gone"),
            Connection::open_search("ds1", "Data Source 1"),
            Connection::open_search("ds2", "Data Source 2"),
            Connection::direct_query("ds1-dqc1", "Direct Query 1", "ds1"),
        ]
    }

    #[test]
    fn test_rows_nest_children_under_parent() {
        let rows = assigned_rows(&assigned());
        let ids: Vec<(&str, bool)> = rows.iter().map(|r| (r.id.as_str(), r.nested)).collect();
        assert_eq!(
            ids,
            vec![
                ("orphan-dq", false),
                ("ds1", false),
                ("ds1-dqc1", true),
                ("ds2", false),
            ]
        );
    }

    #[test]
    fn test_space_marks_cursor_row() {
        let rows = assigned_rows(&assigned());
        let mut table = AssignedTable::new();

        table.handle_key(key(KeyCode::Char('j')), &rows, true);
        assert_eq!(
            table.handle_key(key(KeyCode::Char(' ')), &rows, true),
            TableAction::ToggleMark("ds1".to_string())
        );
    }

    #[test]
    fn test_cursor_clamps() {
        let rows = assigned_rows(&assigned());
        let mut table = AssignedTable::new();

        for _ in 0..10 {
            table.handle_key(key(KeyCode::Down), &rows, true);
        }
        assert_eq!(table.cursor(), 3);
        table.handle_key(key(KeyCode::Char('g')), &rows, true);
        assert_eq!(table.cursor(), 0);
    }

    #[test]
    fn test_assign_shortcuts_follow_empty_state() {
        let mut table = AssignedTable::new();

        assert_eq!(
            table.handle_key(key(KeyCode::Char('a')), &[], true),
            TableAction::Open(PanelTrigger::EmptyPromptAssign)
        );
        assert_eq!(
            table.handle_key(key(KeyCode::Char('d')), &[], true),
            TableAction::Open(PanelTrigger::EmptyPromptDirectQueryAssign)
        );
        assert_eq!(
            table.handle_key(key(KeyCode::Char('d')), &[], false),
            TableAction::Continue
        );

        let rows = assigned_rows(&assigned());
        assert_eq!(
            table.handle_key(key(KeyCode::Char('a')), &rows, true),
            TableAction::Open(PanelTrigger::Assign)
        );
        assert_eq!(
            table.handle_key(key(KeyCode::Char('d')), &rows, true),
            TableAction::Continue
        );
    }

    #[test]
    fn test_remove_and_quit_keys() {
        let rows = assigned_rows(&assigned());
        let mut table = AssignedTable::new();

        assert_eq!(
            table.handle_key(key(KeyCode::Delete), &rows, true),
            TableAction::RemoveSelected
        );
        assert_eq!(
            table.handle_key(key(KeyCode::Char('q')), &rows, true),
            TableAction::Quit
        );
    }
}
