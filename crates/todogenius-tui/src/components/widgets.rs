use ratatui::prelude::*;
use todogenius_core::display::{contrast_text_color, parse_hex_color, DueState};
use todogenius_core::priority::PriorityBand;

/// `#RRGGBB` to a terminal colour. Unparseable input falls back to gray.
pub fn hex_color(hex: &str) -> Color {
    match parse_hex_color(hex) {
        Some((r, g, b)) => Color::Rgb(r, g, b),
        None => Color::Gray,
    }
}

/// A category label drawn on its own colour.
pub fn category_span(name: &str, color: &str) -> Span<'static> {
    Span::styled(
        format!(" {name} "),
        Style::default()
            .bg(hex_color(color))
            .fg(hex_color(contrast_text_color(color))),
    )
}

pub fn band_style(band: PriorityBand) -> Style {
    match band {
        PriorityBand::High => Style::default().fg(Color::Red).bold(),
        PriorityBand::Medium => Style::default().fg(Color::Yellow),
        PriorityBand::Low => Style::default().fg(Color::Green),
    }
}

pub fn due_style(state: DueState) -> Style {
    match state {
        DueState::Overdue => Style::default().fg(Color::Red).bold(),
        DueState::DueSoon => Style::default().fg(Color::Yellow),
        DueState::Upcoming => Style::default().fg(Color::Gray),
        DueState::Done | DueState::NoDeadline => Style::default().fg(Color::DarkGray),
    }
}

/// Ten-cell bar for a score in [0, 1].
pub fn priority_bar(score: f64) -> String {
    let filled = (score.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

pub fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let spans: Vec<Span> = hints
        .iter()
        .flat_map(|(key, desc)| {
            vec![
                Span::styled(format!(" {key}"), Style::default().fg(Color::Yellow).bold()),
                Span::raw(format!(" {desc} ")),
            ]
        })
        .collect();
    Line::from(spans)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
