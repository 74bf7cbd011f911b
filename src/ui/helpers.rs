use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};

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

/// Alternating background for table rows.
pub(crate) fn stripe_style(index: usize) -> Style {
    if index % 2 == 0 {
        Style::default()
    } else {
        Style::default().bg(Color::Indexed(236))
    }
}

/// Cursor column for text of `len` characters inside a box starting at `x`
/// with `width` usable cells. Stays inside the box when the text overflows.
pub(crate) fn cursor_column(x: u16, width: u16, len: usize) -> u16 {
    let len = u16::try_from(len).unwrap_or(u16::MAX);
    x + len.min(width.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(60, 40, area);

        assert_eq!(popup.width, 60);
        assert_eq!(popup.height, 20);
        assert_eq!(popup.x, 20);
        assert_eq!(popup.y, 15);
    }

    #[test]
    fn cursor_is_clamped_to_box() {
        assert_eq!(cursor_column(5, 10, 3), 8);
        assert_eq!(cursor_column(5, 10, 40), 14);
        assert_eq!(cursor_column(5, 0, 3), 5);
    }
}
