//! Association modal: pick the connections to associate with the workspace.
//!
//! Provides:
//! - Checkbox list of candidates with fuzzy filtering on the name
//! - Spinner while the catalog loads; candidates are inert meanwhile
//! - Space toggles, Enter associates, Esc closes

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use nucleo_matcher::{
    pattern::{CaseMatching, Normalization, Pattern},
    Config, Matcher, Utf32Str,
};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;
use throbber_widgets_tui::{Throbber, ThrobberState};

use super::{centered_rect, is_inside, truncate_to_width};
use crate::app::{ModalMode, PanelTrigger};
use crate::source::{Catalog, Connection};

/// One candidate as the modal shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    pub id: String,
    pub name: String,
    pub detail: String,
    pub selected: bool,
}

impl CandidateRow {
    pub fn new(conn: &Connection, selected: bool) -> Self {
        Self {
            id: conn.id.clone(),
            name: conn.name.clone(),
            detail: conn.short_display(),
            selected,
        }
    }

    /// Name the owning data source of a direct-query candidate.
    pub fn with_parent(mut self, catalog: &Catalog) -> Self {
        if let Some(parent) = catalog.parent_of(&self.id) {
            self.detail = format!("{} on {}", self.detail, parent.name);
        } else if catalog.is_orphan(&self.id) {
            self.detail = format!("{} (data source unavailable)", self.detail);
        }
        self
    }
}

/// Everything the modal needs from the panel for one frame.
pub struct ModalView<'a> {
    pub mode: ModalMode,
    pub rows: &'a [CandidateRow],
    /// Size of the whole pending selection, across both modes
    pub pending: usize,
    pub loading: bool,
    pub error: Option<&'a str>,
}

impl ModalView<'_> {
    fn status_text(&self) -> String {
        let chosen = self.rows.iter().filter(|r| r.selected).count();
        if chosen == self.pending {
            format!(" {} of {} selected ", chosen, self.rows.len())
        } else {
            format!(
                " {} of {} selected ({} pending in total) ",
                chosen,
                self.rows.len(),
                self.pending
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalAction {
    Continue,
    Toggle(String),
    Associate,
    Close,
}

#[derive(Debug, Clone)]
struct RowMatch {
    index: usize,
    indices: Vec<u32>,
}

pub struct AssociationModal {
    query: String,
    /// Highlighted position in the filtered list
    selected: usize,
    scroll_offset: usize,
    matcher: Matcher,
    throbber: ThrobberState,
    visible_height: usize,
    modal_area: Option<Rect>,
    list_area: Option<Rect>,
}

impl Default for AssociationModal {
    fn default() -> Self {
        Self::new()
    }
}

impl AssociationModal {
    pub fn new() -> Self {
        Self {
            query: String::new(),
            selected: 0,
            scroll_offset: 0,
            matcher: Matcher::new(Config::DEFAULT),
            throbber: ThrobberState::default(),
            visible_height: 10,
            modal_area: None,
            list_area: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Advance the loading spinner.
    pub fn tick(&mut self) {
        self.throbber.calc_next();
    }

    fn filter(&mut self, rows: &[CandidateRow]) -> Vec<RowMatch> {
        if self.query.is_empty() {
            return (0..rows.len())
                .map(|index| RowMatch {
                    index,
                    indices: Vec::new(),
                })
                .collect();
        }

        let pattern = Pattern::parse(&self.query, CaseMatching::Ignore, Normalization::Smart);
        let mut scored: Vec<(u32, RowMatch)> = rows
            .iter()
            .enumerate()
            .filter_map(|(index, row)| {
                let mut buf = Vec::new();
                let mut indices = Vec::new();
                let haystack = Utf32Str::new(&row.name, &mut buf);
                pattern
                    .indices(haystack, &mut self.matcher, &mut indices)
                    .map(|score| (score, RowMatch { index, indices }))
            })
            .collect();

        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.into_iter().map(|(_, m)| m).collect()
    }

    /// Ids of the rows currently visible through the filter, in display order.
    pub fn visible_ids(&mut self, rows: &[CandidateRow]) -> Vec<String> {
        self.filter(rows)
            .into_iter()
            .map(|m| rows[m.index].id.clone())
            .collect()
    }

    pub fn handle_key(&mut self, key: KeyEvent, rows: &[CandidateRow]) -> ModalAction {
        let matches = self.filter(rows);

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) | (KeyCode::Char('c'), KeyModifiers::CONTROL) => ModalAction::Close,

            (KeyCode::Enter, _) => ModalAction::Associate,

            (KeyCode::Char(' '), _) => match matches.get(self.selected) {
                Some(m) => ModalAction::Toggle(rows[m.index].id.clone()),
                None => ModalAction::Continue,
            },

            (KeyCode::Up, _) | (KeyCode::Char('p'), KeyModifiers::CONTROL) => {
                self.selected = self.selected.saturating_sub(1);
                ModalAction::Continue
            }
            (KeyCode::Down, _) | (KeyCode::Char('n'), KeyModifiers::CONTROL) => {
                if self.selected + 1 < matches.len() {
                    self.selected += 1;
                }
                ModalAction::Continue
            }

            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                self.set_query(String::new());
                ModalAction::Continue
            }
            (KeyCode::Backspace, _) => {
                let mut query = self.query.clone();
                if query.pop().is_some() {
                    self.set_query(query);
                }
                ModalAction::Continue
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                let mut query = self.query.clone();
                query.push(c);
                self.set_query(query);
                ModalAction::Continue
            }

            _ => ModalAction::Continue,
        }
    }

    fn set_query(&mut self, query: String) {
        self.query = query;
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent, rows: &[CandidateRow]) -> ModalAction {
        let (x, y) = (mouse.column, mouse.row);
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return ModalAction::Continue;
        }

        if let Some(modal) = self.modal_area {
            if !is_inside(x, y, modal) {
                return ModalAction::Close;
            }
        }

        if let Some(list) = self.list_area {
            if is_inside(x, y, list) {
                let matches = self.filter(rows);
                let clicked = self.scroll_offset + (y - list.y) as usize;
                if let Some(m) = matches.get(clicked) {
                    self.selected = clicked;
                    return ModalAction::Toggle(rows[m.index].id.clone());
                }
            }
        }

        ModalAction::Continue
    }

    fn ensure_selected_visible(&mut self) {
        if self.visible_height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        }
        if self.selected >= self.scroll_offset + self.visible_height {
            self.scroll_offset = self.selected - self.visible_height + 1;
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, view: &ModalView) {
        let width = ((area.width as f32 * 0.70) as u16).clamp(50, 90);
        let height = ((area.height as f32 * 0.70) as u16).clamp(14, 32);
        let modal_area = centered_rect(width, height, area);
        self.modal_area = Some(modal_area);

        frame.render_widget(Clear, modal_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(view.mode.title())
            .title_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let chunks = Layout::vertical([
            Constraint::Length(3), // Description
            Constraint::Length(1), // Filter
            Constraint::Length(1), // Separator
            Constraint::Min(1),    // Candidates
            Constraint::Length(1), // Status / error
            Constraint::Length(1), // Help
        ])
        .split(inner);

        let description = Paragraph::new(view.mode.description())
            .style(Style::default().fg(Color::Gray))
            .wrap(Wrap { trim: true });
        frame.render_widget(description, chunks[0]);

        let filter = Line::from(vec![
            Span::styled("> ", Style::default().fg(Color::Yellow)),
            Span::raw(self.query.clone()),
            Span::styled(" ", Style::default().bg(Color::White)),
        ]);
        frame.render_widget(Paragraph::new(filter), chunks[1]);

        let sep = Paragraph::new("─".repeat(chunks[2].width as usize))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(sep, chunks[2]);

        if view.loading {
            let throbber = Throbber::default()
                .label("Loading data sources...")
                .style(Style::default().fg(Color::DarkGray))
                .throbber_style(Style::default().fg(Color::Cyan));
            frame.render_stateful_widget(throbber, chunks[3], &mut self.throbber);
            self.list_area = None;
        } else {
            self.render_list(frame, chunks[3], view.rows);
        }

        self.render_status(frame, chunks[4], view);
        self.render_help(frame, chunks[5]);
    }

    fn render_list(&mut self, frame: &mut Frame, area: Rect, rows: &[CandidateRow]) {
        self.visible_height = area.height as usize;
        self.list_area = Some(area);

        let matches = self.filter(rows);
        if matches.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No data sources available",
                Style::default().fg(Color::DarkGray),
            )))
            .alignment(Alignment::Center);
            frame.render_widget(empty, area);
            return;
        }

        if self.selected >= matches.len() {
            self.selected = matches.len() - 1;
        }
        self.ensure_selected_visible();

        let name_width = (area.width as usize / 2).max(8);
        let items: Vec<ListItem> = matches
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.visible_height)
            .map(|(i, m)| render_row(&rows[m.index], &m.indices, name_width, i == self.selected))
            .collect();

        frame.render_widget(List::new(items), area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect, view: &ModalView) {
        let line = if let Some(error) = view.error {
            Line::from(Span::styled(
                format!("Could not load every data source: {}", error),
                Style::default().fg(Color::Red),
            ))
        } else {
            Line::from(Span::styled(
                view.status_text(),
                Style::default().fg(Color::DarkGray),
            ))
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let help = Line::from(vec![
            Span::styled("[Space]", Style::default().fg(Color::Yellow)),
            Span::raw(" toggle "),
            Span::styled("[Enter]", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" {} ", PanelTrigger::Associate.label())),
            Span::styled("[Esc]", Style::default().fg(Color::Yellow)),
            Span::raw(format!(" {}", PanelTrigger::Close.label())),
        ]);
        frame.render_widget(Paragraph::new(help).alignment(Alignment::Center), area);
    }
}

fn render_row(
    row: &CandidateRow,
    indices: &[u32],
    name_width: usize,
    highlighted: bool,
) -> ListItem<'static> {
    let checkbox = if row.selected { "[x] " } else { "[ ] " };
    let mut spans = vec![Span::styled(
        checkbox,
        Style::default().fg(if row.selected {
            Color::Green
        } else {
            Color::DarkGray
        }),
    )];

    let name = truncate_to_width(&row.name, name_width);
    let matched: std::collections::HashSet<usize> = indices.iter().map(|&i| i as usize).collect();
    for (i, c) in name.chars().enumerate() {
        let style = if matched.contains(&i) {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().add_modifier(Modifier::BOLD)
        };
        spans.push(Span::styled(c.to_string(), style));
    }

    let pad = name_width.saturating_sub(unicode_width::UnicodeWidthStr::width(name.as_str()));
    spans.push(Span::raw(" ".repeat(pad + 1)));
    spans.push(Span::styled(
        row.detail.clone(),
        Style::default().fg(Color::DarkGray),
    ));

    let style = if highlighted {
        Style::default().bg(Color::DarkGray)
    } else {
        Style::default()
    };
    ListItem::new(Line::from(spans)).style(style)
}
