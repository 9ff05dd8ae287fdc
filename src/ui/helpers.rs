use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Span;

use crate::models::ReadStatus;

/// Coloured `Read`/`Unread` badge for the status column.
pub(crate) fn status_span(status: ReadStatus) -> Span<'static> {
    let style = match status {
        ReadStatus::Read => Style::default().fg(Color::Green),
        ReadStatus::Unread => Style::default().fg(Color::Red),
    };
    Span::styled(status.to_string(), style)
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Terminal column for a cursor `offset` cells right of `origin`, pinned to
/// the edge instead of overflowing on very long input.
pub(crate) fn cursor_column(origin: u16, offset: usize) -> u16 {
    origin.saturating_add(u16::try_from(offset).unwrap_or(u16::MAX))
}

/// Footer text for an error: every message in the chain, outermost context
/// first and innermost cause last, joined with `": "`.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .map(|cause| cause.to_string())
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LibraryError;
    use anyhow::Context;

    #[test]
    fn surface_error_joins_chain() {
        let err = Err::<(), _>(LibraryError::malformed(3, "missing Author"))
            .context("Import failed")
            .unwrap_err();
        assert_eq!(surface_error(&err), "Import failed: line 3: missing Author");
    }

    #[test]
    fn cursor_column_saturates() {
        assert_eq!(cursor_column(4, 10), 14);
        assert_eq!(cursor_column(10, usize::from(u16::MAX)), u16::MAX);
        assert_eq!(cursor_column(1, 200_000), u16::MAX);
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);
        assert!(popup.x >= area.x && popup.right() <= area.right());
        assert!(popup.y >= area.y && popup.bottom() <= area.bottom());
        assert_eq!(popup.width, 60);
    }
}
