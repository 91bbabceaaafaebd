mod assigned_table;
mod association_modal;
mod confirm_prompt;

pub use assigned_table::{assigned_rows, AssignedRow, AssignedTable, TableAction, EMPTY_PROMPT};
pub use association_modal::{AssociationModal, CandidateRow, ModalAction, ModalView};
pub use confirm_prompt::{ConfirmContext, ConfirmPrompt, ConfirmResult};

use ratatui::layout::Rect;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Point-in-rect test for mouse hit testing. Right and bottom edges are exclusive.
pub(crate) fn is_inside(x: u16, y: u16, rect: Rect) -> bool {
    let (x, y) = (u32::from(x), u32::from(y));
    let (left, top) = (u32::from(rect.x), u32::from(rect.y));
    (left..left + u32::from(rect.width)).contains(&x)
        && (top..top + u32::from(rect.height)).contains(&y)
}

pub(crate) fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Cut `text` to at most `max` display columns, ending with `…` when cut.
pub(crate) fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > max - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_inside_edges() {
        let rect = Rect::new(2, 3, 4, 2);
        assert!(is_inside(2, 3, rect));
        assert!(is_inside(5, 4, rect));
        assert!(!is_inside(6, 4, rect));
        assert!(!is_inside(5, 5, rect));
        assert!(!is_inside(1, 3, rect));
    }

    #[test]
    fn test_is_inside_no_overflow() {
        let rect = Rect::new(u16::MAX - 1, u16::MAX - 1, 10, 10);
        assert!(is_inside(u16::MAX, u16::MAX, rect));
    }

    #[test]
    fn test_centered_rect_clamps() {
        let area = Rect::new(0, 0, 20, 10);
        assert_eq!(centered_rect(10, 4, area), Rect::new(5, 3, 10, 4));
        assert_eq!(centered_rect(40, 40, area), Rect::new(0, 0, 20, 10));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("Data Source 1", 6), "Data …");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
