//! Pure presentation rules shared by every view: deadline urgency, date
//! labels and category colour handling.

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::task::Task;

/// How many days ahead a deadline counts as "due soon".
pub const DUE_SOON_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DueState {
    NoDeadline,
    Overdue,
    DueSoon,
    Upcoming,
    /// Completed tasks are never urgent.
    Done,
}

pub fn due_state(task: &Task, now: DateTime<Utc>) -> DueState {
    let Some(deadline) = task.deadline.map(|d| d.with_timezone(&Utc)) else {
        return DueState::NoDeadline;
    };
    if task.is_completed() {
        return DueState::Done;
    }
    if deadline < now {
        DueState::Overdue
    } else if deadline <= now + Duration::days(DUE_SOON_DAYS) {
        DueState::DueSoon
    } else {
        DueState::Upcoming
    }
}

/// `01 Jun 2025`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}

/// Today, Yesterday, "N days ago" within a week, otherwise the full date.
pub fn relative_date(date: NaiveDate, today: NaiveDate) -> String {
    let days = (today - date).num_days();
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => format_date(date),
    }
}

/// Parse `#RRGGBB` into its components.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

/// Readable text colour on top of `background`: black on light colours,
/// white on dark ones.
pub fn contrast_text_color(background: &str) -> &'static str {
    let Some((r, g, b)) = parse_hex_color(background) else {
        return "#000000";
    };
    let brightness = (u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000;
    if brightness > 128 {
        "#000000"
    } else {
        "#FFFFFF"
    }
}

/// `(completed, total)` for the header counter.
pub fn completion_summary(tasks: &[Task]) -> (usize, usize) {
    let done = tasks.iter().filter(|t| t.is_completed()).count();
    (done, tasks.len())
}
