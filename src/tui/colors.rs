//! Color constants for the terminal user interface.

use chrono::NaiveDate;
use ratatui::style::{Color, Style};

use crate::fields::WorkloadStatus;
use crate::metrics::is_overdue;
use crate::task::{STATUS_BACKLOG, STATUS_BLOCKED, STATUS_COMPLETED, STATUS_IN_PROGRESS};

pub const DARK_GREEN: Color = Color::Rgb(0, 80, 0);
pub const GOLD: Color = Color::Rgb(255, 215, 0);
pub const DARK_RED: Color = Color::Rgb(114, 0, 0);
pub const SLATE: Color = Color::Rgb(70, 80, 100);

/// Bar and text color for a task status. Unrecognised statuses are neutral.
pub fn status_color(status: &str) -> Color {
    match status {
        STATUS_COMPLETED => Color::Green,
        STATUS_IN_PROGRESS => Color::Blue,
        STATUS_BLOCKED => Color::Red,
        STATUS_BACKLOG => Color::Gray,
        _ => Color::White,
    }
}

pub fn priority_color(priority: &str) -> Color {
    match priority {
        "P0" => Color::Red,
        "P1" => Color::Yellow,
        "P2" => Color::Cyan,
        _ => Color::Gray,
    }
}

/// Days-left text color: red once the end date has passed.
pub fn days_remaining_style(end_date: &str, today: NaiveDate) -> Style {
    if is_overdue(end_date, today) {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    }
}

pub fn workload_color(status: WorkloadStatus) -> Color {
    match status {
        WorkloadStatus::Free => Color::Green,
        WorkloadStatus::Available => GOLD,
        WorkloadStatus::Overloaded => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overdue_days_are_red() {
        let today = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();
        assert_eq!(days_remaining_style("2025-12-01", today).fg, Some(Color::Red));
        assert_eq!(days_remaining_style("2025-12-20", today).fg, None);
        assert_eq!(days_remaining_style("", today).fg, None);
    }
}
