//! The loaded task batch and text-formatting helpers for the CLI.
//!
//! This module provides the `Board` struct, one complete snapshot of the sheet built
//! atomically from one payload, along with formatting utilities shared by the command
//! handlers (tables, relative dates, timeline bars).

use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};
use serde::Serialize;
use tracing::{info, warn};

use crate::metrics::{days_remaining, parse_date, DateRange, TaskPosition};
use crate::normalize::{expected_headers, normalize};
use crate::parser::parse;
use crate::source::{demo_tasks, fetch_text, Source};
use crate::task::Task;

/// Where the tasks of a board came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Origin {
    Source { description: String },
    Demo { reason: String },
}

/// One fetched batch of tasks. Replaced wholesale on every refresh, never patched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub tasks: Vec<Task>,
    pub origin: Origin,
    pub loaded_at: DateTime<Local>,
}

impl Board {
    /// Board showing the demonstration batch, annotated with why it is used.
    pub fn demo(reason: impl Into<String>) -> Self {
        Board {
            tasks: demo_tasks(),
            origin: Origin::Demo {
                reason: reason.into(),
            },
            loaded_at: Local::now(),
        }
    }

    /// Parse and normalise a CSV payload. An empty result falls back to the demo batch.
    pub fn from_csv(text: &str, description: impl Into<String>) -> Self {
        let rows = parse(text);
        if rows.is_empty() {
            warn!(expected = %expected_headers(), "no rows found; check the sheet has data and a header row");
            return Board::demo("the sheet contained no task rows");
        }
        let tasks = normalize(&rows, 1);
        info!(tasks = tasks.len(), "board loaded");
        Board {
            tasks,
            origin: Origin::Source {
                description: description.into(),
            },
            loaded_at: Local::now(),
        }
    }

    /// Fetch and build a board. Never fails: any source error yields the demo batch.
    pub fn load(source: &Source, timeout: Duration) -> Self {
        match fetch_text(source, timeout) {
            Ok(text) => Board::from_csv(&text, source.describe()),
            Err(e) => {
                warn!(error = %e, "using demo data");
                Board::demo(e.to_string())
            }
        }
    }

    /// Get a task by ID.
    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.origin, Origin::Demo { .. })
    }

    /// "Just now", "5m ago", "2h ago" or the load date.
    pub fn last_updated(&self, now: DateTime<Local>) -> String {
        format_elapsed(self.loaded_at, now)
    }
}

/// Coarse elapsed-time label.
pub fn format_elapsed(then: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - then).num_seconds().max(0);
    if secs < 60 {
        "Just now".to_string()
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3600)
    } else {
        then.format("%Y-%m-%d").to_string()
    }
}

/// Format a sheet date for display, e.g. "Dec 1, 2025". Unparsable input is shown as-is.
pub fn format_date(raw: &str) -> String {
    match parse_date(raw) {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// Days remaining as shown to a reader: "N days" or "N/A".
pub fn format_days_remaining(end_date: &str, today: NaiveDate) -> String {
    match days_remaining(end_date, today) {
        Some(1) => "1 day".to_string(),
        Some(-1) => "-1 day".to_string(),
        Some(n) => format!("{n} days"),
        None => "N/A".to_string(),
    }
}

/// Format mandays without a trailing ".0" for whole numbers.
pub fn format_mandays(mandays: f64) -> String {
    if mandays.fract() == 0.0 {
        format!("{mandays:.0}")
    } else {
        format!("{mandays}")
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks as the sheet table.
pub fn print_table(tasks: &[&Task]) {
    println!(
        "{:<4} {:<10} {:<20} {:<30} {:<10} {:<12} {:>5} {:<4} {:<12} {:<12}",
        "ID", "Platform", "Project", "Task", "Dev", "Status", "Days", "Pri", "Start", "End"
    );
    for t in tasks {
        println!(
            "{:<4} {:<10} {:<20} {:<30} {:<10} {:<12} {:>5} {:<4} {:<12} {:<12}",
            t.id,
            truncate(&t.platform, 10),
            truncate(&t.project, 20),
            truncate(&t.title, 30),
            truncate(&t.dev, 10),
            truncate(&t.status, 12),
            format_mandays(t.mandays),
            truncate(&t.priority, 4),
            truncate(&format_date(&t.start_date), 12),
            truncate(&format_date(&t.end_date), 12),
        );
    }
}

/// Render a timeline bar of `width` cells for a task placed at `pos`.
///
/// Bars running past the right edge are cut at the edge; every bar covers at least one cell.
pub fn render_bar(pos: &TaskPosition, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let cell = |percent: f64| ((percent / 100.0) * width as f64).round() as usize;
    let start = cell(pos.left_percent).min(width - 1);
    let len = cell(pos.width_percent).max(1).min(width - start);
    let mut bar = String::with_capacity(width * 3);
    bar.push_str(&" ".repeat(start));
    bar.push_str(&"█".repeat(len));
    bar.push_str(&" ".repeat(width - start - len));
    bar
}

/// Week header line aligned with [`render_bar`] output.
pub fn render_week_header(range: &DateRange, ticks: &[NaiveDate], width: usize) -> String {
    let mut line = vec![' '; width];
    let total = (range.end - range.start).num_seconds() as f64;
    if total <= 0.0 {
        return String::new();
    }
    for tick in ticks {
        let offset = (tick.and_time(chrono::NaiveTime::MIN) - range.start).num_seconds() as f64;
        let col = ((offset / total) * width as f64).round() as usize;
        let label = tick.format("%b %-d").to_string();
        for (i, ch) in label.chars().enumerate() {
            if col + i < width {
                line[col + i] = ch;
            }
        }
    }
    line.into_iter().collect::<String>().trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_csv_builds_tasks() {
        let board = Board::from_csv("Task,Dev\nFix bug,Alice\nShip,Bob\n", "tasks.csv");
        assert_eq!(board.tasks.len(), 2);
        assert_eq!(board.get(2).map(|t| t.dev.as_str()), Some("Bob"));
        assert!(!board.is_demo());
        assert_eq!(
            board.origin,
            Origin::Source {
                description: "tasks.csv".into()
            }
        );
    }

    #[test]
    fn test_empty_payload_falls_back_to_demo() {
        let board = Board::from_csv("Platform,Task\n", "sheet");
        assert!(board.is_demo());
        assert_eq!(board.tasks.len(), 5);
    }

    #[test]
    fn test_load_failure_falls_back_to_demo() {
        let board = Board::load(&Source::Unconfigured, Duration::from_secs(1));
        assert!(board.is_demo());
        assert_eq!(board.tasks, demo_tasks());
    }

    #[test]
    fn test_format_elapsed() {
        let then = Local.with_ymd_and_hms(2025, 12, 1, 10, 0, 0).unwrap();
        assert_eq!(format_elapsed(then, then + chrono::Duration::seconds(30)), "Just now");
        assert_eq!(format_elapsed(then, then + chrono::Duration::minutes(5)), "5m ago");
        assert_eq!(format_elapsed(then, then + chrono::Duration::hours(3)), "3h ago");
        assert_eq!(format_elapsed(then, then + chrono::Duration::days(2)), "2025-12-01");
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_date("2025-12-01"), "Dec 1, 2025");
        assert_eq!(format_date("someday"), "someday");
        assert_eq!(format_mandays(5.0), "5");
        assert_eq!(format_mandays(2.5), "2.5");
        let today = NaiveDate::from_ymd_opt(2025, 12, 10).unwrap();
        assert_eq!(format_days_remaining("2025-12-15", today), "6 days");
        assert_eq!(format_days_remaining("2025-12-10", today), "1 day");
        assert_eq!(format_days_remaining("", today), "N/A");
        assert_eq!(truncate("Dashboard Redesign", 10), "Dashboard…");
    }

    #[test]
    fn test_render_bar() {
        let pos = TaskPosition { left_percent: 25.0, width_percent: 50.0 };
        assert_eq!(render_bar(&pos, 8), "  ████  ");

        let overflow = TaskPosition { left_percent: 90.0, width_percent: 300.0 };
        assert_eq!(render_bar(&overflow, 10), "         █");

        let tiny = TaskPosition { left_percent: 0.0, width_percent: 2.0 };
        assert_eq!(render_bar(&tiny, 10), "█         ");
    }
}
