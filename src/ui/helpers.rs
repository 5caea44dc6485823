use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::{BorrowRecord, Cookbook};

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

/// Cursor cell for text input `column` characters into `row` of `inner`,
/// pinned to the last cell so long input never leaves the popup.
pub(crate) fn cursor_position(inner: Rect, column: usize, row: usize) -> (u16, u16) {
    let last_column = inner.width.saturating_sub(1);
    let last_row = inner.height.saturating_sub(1);
    let column = u16::try_from(column).unwrap_or(u16::MAX).min(last_column);
    let row = u16::try_from(row).unwrap_or(u16::MAX).min(last_row);
    (inner.x.saturating_add(column), inner.y.saturating_add(row))
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Compact one-line entry used by the shelf and photogenic lists.
pub(crate) fn cookbook_list_label(cookbook: &Cookbook) -> String {
    let sparkles = cookbook.rating_sparkles();
    if sparkles.is_empty() {
        format!("{:>3}  {}", cookbook.id, cookbook.title)
    } else {
        format!("{:>3}  {}  {}", cookbook.id, cookbook.title, sparkles)
    }
}

fn detail_row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(Color::Gray)),
        Span::raw(value),
    ])
}

/// Detail pane for the selected cookbook, using the same wording as the
/// collection printout: sparkles for the rating and the instagram verdict.
pub(crate) fn cookbook_detail_lines(cookbook: &Cookbook, tags: &[String]) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            cookbook.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        detail_row("ID", cookbook.id.to_string()),
        detail_row("Author", cookbook.author.clone()),
        detail_row("Published", cookbook.published_label()),
        detail_row("Aesthetic Rating", cookbook.rating_sparkles()),
        detail_row("Instagram Worthy", cookbook.instagram_label().to_string()),
        detail_row("Cover Color", cookbook.cover_color_label().to_string()),
        Line::from(""),
    ];

    if tags.is_empty() {
        lines.push(Line::from(Span::styled(
            "No tags yet. Press 't' to add some.",
            Style::default().fg(Color::DarkGray),
        )));
    } else {
        let spans: Vec<Span<'static>> = tags
            .iter()
            .map(|tag| Span::styled(format!("#{tag} "), Style::default().fg(Color::Cyan)))
            .collect();
        lines.push(Line::from(spans));
    }

    lines
}

/// One line per loan. Open loans are highlighted.
pub(crate) fn borrow_record_line(record: &BorrowRecord) -> Line<'static> {
    let returned = match &record.date_returned {
        Some(date) => Span::styled(
            format!("returned {date}"),
            Style::default().fg(Color::DarkGray),
        ),
        None => Span::styled("still out", Style::default().fg(Color::Yellow)),
    };
    Line::from(vec![
        Span::raw(format!("{}  ", record.date_borrowed)),
        Span::styled(
            format!("{}  ", record.friend_name),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        returned,
    ])
}
