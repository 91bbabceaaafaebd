//! Confirmation dialog for destructive panel actions.
//!
//! Used before removing marked connections and before closing the
//! association modal with a pending selection.

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{BorderType, Borders};
use ratatui::Frame;
use tui_confirm_dialog_with_mouse::{ConfirmDialog, ConfirmDialogState};

/// Only one dialog is shown at a time.
const CONFIRM_DIALOG_ID: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmResult {
    Pending,
    Confirmed,
    Cancelled,
}

/// What the user is being asked to confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmContext {
    /// Removing the marked rows from the workspace.
    RemoveSelected { ids: Vec<String> },
    /// Closing the association modal with unsaved toggles.
    DiscardSelection,
}

impl ConfirmContext {
    fn title(&self) -> &'static str {
        match self {
            ConfirmContext::RemoveSelected { .. } => " Remove Data Sources ",
            ConfirmContext::DiscardSelection => " Discard Selection ",
        }
    }

    /// Default message for the context.
    pub fn message(&self) -> String {
        match self {
            ConfirmContext::RemoveSelected { ids } if ids.len() == 1 => {
                format!("Remove '{}' from this workspace?", ids[0])
            }
            ConfirmContext::RemoveSelected { ids } => {
                format!("Remove {} data sources from this workspace?", ids.len())
            }
            ConfirmContext::DiscardSelection => {
                "Close without associating the selected data sources?".to_string()
            }
        }
    }
}

pub struct ConfirmPrompt {
    state: ConfirmDialogState,
    context: ConfirmContext,
}

impl ConfirmPrompt {
    pub fn new(context: ConfirmContext) -> Self {
        let mut state =
            ConfirmDialogState::new(CONFIRM_DIALOG_ID, context.title(), context.message());
        state.open();
        Self { state, context }
    }

    pub fn context(&self) -> &ConfirmContext {
        &self.context
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ConfirmResult {
        let was_opened = self.state.is_opened();
        let _handled = self.state.handle(&key);
        self.outcome(was_opened)
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) -> ConfirmResult {
        let was_opened = self.state.is_opened();
        let _handled = self.state.handle_mouse(&event);
        self.outcome(was_opened)
    }

    fn outcome(&self, was_opened: bool) -> ConfirmResult {
        if !was_opened || self.state.is_opened() {
            return ConfirmResult::Pending;
        }
        // Esc and clicks outside leave `Some(None)`.
        match self.state.last_result {
            Some(Some(true)) => ConfirmResult::Confirmed,
            Some(Some(false)) | Some(None) => ConfirmResult::Cancelled,
            None => ConfirmResult::Pending,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect) {
        let border = match self.context {
            ConfirmContext::RemoveSelected { .. } => Color::Red,
            ConfirmContext::DiscardSelection => Color::Yellow,
        };
        let dialog = ConfirmDialog::new()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(border))
            .button_style(Style::default().fg(Color::White))
            .selected_button_style(
                Style::default()
                    .fg(border)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )
            .text_style(Style::default().fg(Color::White));

        frame.render_stateful_widget(dialog, area, &mut self.state);
    }
}
