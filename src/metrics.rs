//! Derived values computed from a task batch.
//!
//! Nothing here is stored on a [`Task`]: days remaining, developer workload and the
//! timeline's date range are recomputed from the immutable batch on every request.
//! All functions are total; unparsable dates simply drop out of date-based results.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::fields::{ViewState, WorkloadStatus};
use crate::task::Task;

/// Default weekly capacity per developer, in mandays.
pub const DEFAULT_WEEKLY_CAPACITY: f64 = 40.0;

/// Days of padding added on each side of the timeline range.
pub const RANGE_PADDING_DAYS: i64 = 7;

/// Minimum width of a timeline bar, in percent of the range.
pub const MIN_BAR_WIDTH_PERCENT: f64 = 2.0;

/// Upper bound on week header ticks; wider ranges are sampled evenly.
pub const MAX_WEEK_TICKS: i64 = 104;

const SECONDS_PER_DAY: i64 = 86_400;
const MILLIS_PER_DAY: i64 = SECONDS_PER_DAY * 1_000;

const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse a sheet date cell into a local calendar instant.
///
/// Date-only values land on their midnight. RFC 3339 timestamps are converted to local time.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

/// Whole days from the start of `today` until the end of the task's end day, rounded up.
///
/// A task due today has 1 day left. `None` when the end date is unset or unparsable.
/// End dates before yesterday are negative.
pub fn days_remaining(end_date: &str, today: NaiveDate) -> Option<i64> {
    let end_of_day = parse_date(end_date)?.date().and_hms_milli_opt(23, 59, 59, 999)?;
    let millis = (end_of_day - today.and_time(NaiveTime::MIN)).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    Some(if millis.rem_euclid(MILLIS_PER_DAY) == 0 { days } else { days + 1 })
}

/// Whether the task's end date has passed, which callers flag as urgent.
pub fn is_overdue(end_date: &str, today: NaiveDate) -> bool {
    days_remaining(end_date, today).is_some_and(|d| d < 0)
}

fn raw_utilization(total_mandays: f64, capacity: f64) -> f64 {
    if capacity <= 0.0 || !capacity.is_finite() {
        return 0.0;
    }
    total_mandays / capacity * 100.0
}

/// Assigned effort as a rounded percentage of `capacity` (half away from zero).
pub fn utilization_percent(total_mandays: f64, capacity: f64) -> i64 {
    raw_utilization(total_mandays, capacity).round() as i64
}

/// One developer's open work measured against weekly capacity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Workload<'a> {
    pub dev: String,
    pub tasks: Vec<&'a Task>,
    pub total_mandays: f64,
    pub available_mandays: f64,
    pub utilization_percent: i64,
    pub status: WorkloadStatus,
    pub emoji: &'static str,
}

/// Workload of `dev` over every task not marked Completed.
pub fn workload<'a>(tasks: &'a [Task], dev: &str, weekly_capacity: f64) -> Workload<'a> {
    let open: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.dev == dev && !t.is_completed())
        .collect();
    let total_mandays: f64 = open.iter().map(|t| t.mandays).sum();
    // Classified before rounding: 30.25% is already Available.
    let status = WorkloadStatus::classify(raw_utilization(total_mandays, weekly_capacity));

    Workload {
        dev: dev.to_string(),
        tasks: open,
        total_mandays,
        available_mandays: (weekly_capacity - total_mandays).max(0.0),
        utilization_percent: utilization_percent(total_mandays, weekly_capacity),
        status,
        emoji: status.emoji(),
    }
}

/// Team-level counts shown next to the workload chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadSummary {
    pub developers: usize,
    pub active_tasks: usize,
    pub free: usize,
    pub available: usize,
    pub overloaded: usize,
    pub average_utilization: i64,
}

/// Workload for every developer of a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadReport<'a> {
    pub state: ViewState,
    pub capacity: f64,
    /// Heaviest first; ties keep developer name order.
    pub entries: Vec<Workload<'a>>,
    /// Developers whose tasks are all completed.
    pub idle: Vec<String>,
    pub summary: WorkloadSummary,
}

/// Distinct non-empty developer names in lexicographic order.
pub fn developers(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| !t.dev.is_empty())
        .map(|t| t.dev.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Developers with no open work: every task assigned to them is completed.
pub fn idle_developers(tasks: &[Task]) -> Vec<String> {
    developers(tasks)
        .into_iter()
        .filter(|dev| tasks.iter().all(|t| &t.dev != dev || t.is_completed()))
        .collect()
}

/// Build the workload view for all developers.
pub fn workload_report(tasks: &[Task], weekly_capacity: f64) -> WorkloadReport<'_> {
    let devs = developers(tasks);
    let mut entries: Vec<Workload> = devs
        .iter()
        .map(|dev| workload(tasks, dev, weekly_capacity))
        .collect();
    entries.sort_by(|a, b| b.total_mandays.total_cmp(&a.total_mandays));

    let idle = idle_developers(tasks);

    let count = |s: WorkloadStatus| entries.iter().filter(|w| w.status == s).count();
    let average_utilization = if entries.is_empty() {
        0
    } else {
        let sum: i64 = entries.iter().map(|w| w.utilization_percent).sum();
        (sum as f64 / entries.len() as f64).round() as i64
    };
    let summary = WorkloadSummary {
        developers: entries.len(),
        active_tasks: entries.iter().map(|w| w.tasks.len()).sum(),
        free: count(WorkloadStatus::Free),
        available: count(WorkloadStatus::Available),
        overloaded: count(WorkloadStatus::Overloaded),
        average_utilization,
    };

    WorkloadReport {
        state: if entries.is_empty() {
            ViewState::NoData
        } else {
            ViewState::Rows
        },
        capacity: weekly_capacity,
        entries,
        idle,
        summary,
    }
}

/// Span covered by the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Zero-width range, produced when no task has both dates.
    pub fn is_degenerate(&self) -> bool {
        self.end <= self.start
    }

    /// Whole days covered, rounded up.
    pub fn days(&self) -> i64 {
        let secs = (self.end - self.start).num_seconds().max(0);
        (secs + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }
}

/// Start and end instants of a task when both parse.
pub fn task_span(task: &Task) -> Option<(NaiveDateTime, NaiveDateTime)> {
    Some((parse_date(&task.start_date)?, parse_date(&task.end_date)?))
}

/// Tasks that can be placed on the timeline, in input order.
pub fn timeline_tasks<'a, I>(tasks: I) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    tasks.into_iter().filter(|t| task_span(t).is_some()).collect()
}

/// Padded min/max over every start and end date of fully-dated tasks.
///
/// With no fully-dated task the range collapses to `now..now`. Padding saturates at the
/// limits of the calendar.
pub fn date_range<'a, I>(tasks: I, now: NaiveDateTime) -> DateRange
where
    I: IntoIterator<Item = &'a Task>,
{
    let instants: Vec<NaiveDateTime> = tasks
        .into_iter()
        .filter_map(task_span)
        .flat_map(|(start, end)| [start, end])
        .collect();

    match (instants.iter().min(), instants.iter().max()) {
        (Some(&min), Some(&max)) => DateRange {
            start: min
                .checked_sub_signed(Duration::days(RANGE_PADDING_DAYS))
                .unwrap_or(NaiveDateTime::MIN),
            end: max
                .checked_add_signed(Duration::days(RANGE_PADDING_DAYS))
                .unwrap_or(NaiveDateTime::MAX),
        },
        _ => DateRange { start: now, end: now },
    }
}

/// Horizontal placement of a task bar, in percent of the range width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPosition {
    pub left_percent: f64,
    pub width_percent: f64,
}

/// Place `task` within `range`. `None` when the task lacks a parsable start or end.
///
/// Left is floored at 0 and width at [`MIN_BAR_WIDTH_PERCENT`]; neither is capped, so a
/// task outside the range can extend past 100%. A zero-width range places every task at
/// the left edge with the minimum width.
pub fn task_position(task: &Task, range: &DateRange) -> Option<TaskPosition> {
    let (start, end) = task_span(task)?;
    let total = (range.end - range.start).num_milliseconds() as f64;
    if total <= 0.0 {
        return Some(TaskPosition {
            left_percent: 0.0,
            width_percent: MIN_BAR_WIDTH_PERCENT,
        });
    }
    let left = (start - range.start).num_milliseconds() as f64 / total * 100.0;
    let width = (end - start).num_milliseconds() as f64 / total * 100.0;
    Some(TaskPosition {
        left_percent: left.max(0.0),
        width_percent: width.max(MIN_BAR_WIDTH_PERCENT),
    })
}

/// Week header dates: one per started week of the range.
///
/// Ranges longer than [`MAX_WEEK_TICKS`] weeks get a tick every few weeks instead.
pub fn week_ticks(range: &DateRange) -> Vec<NaiveDate> {
    let weeks = (range.days() + 6) / 7;
    let stride = ((weeks + MAX_WEEK_TICKS - 1) / MAX_WEEK_TICKS).max(1);
    let first = range.start.date();
    (0..weeks)
        .step_by(stride as usize)
        .filter_map(|i| first.checked_add_signed(Duration::days(i * 7)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn task(id: u64, dev: &str, status: &str, mandays: f64) -> Task {
        Task {
            id,
            platform: String::new(),
            project: String::new(),
            title: format!("task {id}"),
            dev: dev.to_string(),
            status: status.to_string(),
            mandays,
            priority: "P2".into(),
            start_date: String::new(),
            end_date: String::new(),
            blocker: String::new(),
            go_live_date: String::new(),
            impact: String::new(),
        }
    }

    fn dated(id: u64, start: &str, end: &str) -> Task {
        Task {
            start_date: start.into(),
            end_date: end.into(),
            ..task(id, "Alice", "Backlog", 1.0)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at_midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2025-12-01"), Some(at_midnight(2025, 12, 1)));
        assert_eq!(parse_date(" 12/20/2025 "), Some(at_midnight(2025, 12, 20)));
        assert_eq!(parse_date("Dec 5, 2025"), Some(at_midnight(2025, 12, 5)));
        assert_eq!(
            parse_date("2025-12-01T09:30:00"),
            Some(date(2025, 12, 1).and_hms_opt(9, 30, 0).unwrap())
        );
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("soon"), None);
        assert_eq!(parse_date("2025-02-30"), None);
    }

    #[test]
    fn test_days_remaining_sign() {
        let today = date(2025, 12, 10);
        assert_eq!(days_remaining("2025-12-10", today), Some(1));
        assert_eq!(days_remaining("2025-12-15", today), Some(6));
        assert_eq!(days_remaining("2025-12-09", today), Some(0));
        assert_eq!(days_remaining("2025-12-07", today), Some(-2));
        assert_eq!(days_remaining("", today), None);
        assert_eq!(days_remaining("tbd", today), None);
    }

    #[test]
    fn test_days_remaining_counts_to_end_of_day() {
        let today = date(2025, 12, 10);
        assert_eq!(days_remaining("2025-12-10T06:00:00", today), Some(1));
        assert_eq!(days_remaining("2025-12-11T23:30:00", today), Some(2));
        assert_eq!(days_remaining("2025-12-09T18:00:00", today), Some(0));
        assert_eq!(days_remaining("+262142-12-31", today).map(|d| d > 0), Some(true));
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2025, 12, 10);
        assert!(is_overdue("2025-12-07", today));
        assert!(!is_overdue("2025-12-09", today));
        assert!(!is_overdue("2025-12-10", today));
        assert!(!is_overdue("", today));
    }

    #[test]
    fn test_workload_scenario() {
        let tasks = vec![
            task(1, "Alice", "In Progress", 5.0),
            task(2, "Alice", "Backlog", 8.0),
            task(3, "Alice", "Blocked", 3.0),
            task(4, "Alice", "Completed", 20.0),
            task(5, "Bob", "In Progress", 30.0),
        ];
        let w = workload(&tasks, "Alice", 40.0);
        assert_eq!(w.total_mandays, 16.0);
        assert_eq!(w.utilization_percent, 40);
        assert_eq!(w.status, WorkloadStatus::Available);
        assert_eq!(w.emoji, "🟡");
        assert_eq!(w.available_mandays, 24.0);
        assert_eq!(w.tasks.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_workload_classifies_before_rounding() {
        let tasks = vec![task(1, "Alice", "In Progress", 12.1)];
        let w = workload(&tasks, "Alice", 40.0);
        assert_eq!(w.utilization_percent, 30); // 30.25%
        assert_eq!(w.status, WorkloadStatus::Available);
        assert_eq!(w.emoji, "🟡");

        let tasks = vec![task(1, "Bob", "In Progress", 12.0)];
        assert_eq!(workload(&tasks, "Bob", 40.0).status, WorkloadStatus::Free);
    }

    #[test]
    fn test_workload_without_open_tasks_is_free() {
        let tasks = vec![task(1, "Dana", "Completed", 10.0)];
        let w = workload(&tasks, "Dana", 40.0);
        assert!(w.tasks.is_empty());
        assert_eq!(w.utilization_percent, 0);
        assert_eq!(w.status, WorkloadStatus::Free);
    }

    #[test]
    fn test_utilization_is_not_capped_and_rounds_half_up() {
        assert_eq!(utilization_percent(60.0, 40.0), 150);
        assert_eq!(utilization_percent(61.0, 200.0), 31); // 30.5%
        assert_eq!(utilization_percent(5.0, 0.0), 0);
    }

    #[test]
    fn test_workload_report_orders_heaviest_first() {
        let tasks = vec![
            task(1, "Alice", "In Progress", 5.0),
            task(2, "Bob", "In Progress", 30.0),
            task(3, "Cara", "Completed", 3.0),
            task(4, "", "Backlog", 3.0),
        ];
        let report = workload_report(&tasks, 40.0);
        let order: Vec<&str> = report.entries.iter().map(|w| w.dev.as_str()).collect();
        assert_eq!(order, vec!["Bob", "Alice", "Cara"]);
        assert_eq!(report.idle, vec!["Cara".to_string()]);
        assert_eq!(report.state, ViewState::Rows);
        assert_eq!(report.summary.overloaded, 1);
        assert_eq!(report.summary.free, 2);
        assert_eq!(report.summary.active_tasks, 2);
    }

    #[test]
    fn test_workload_report_without_developers() {
        let report = workload_report(&[], 40.0);
        assert_eq!(report.state, ViewState::NoData);
        assert!(report.entries.is_empty());
        assert_eq!(report.summary, WorkloadSummary::default());
    }

    #[test]
    fn test_date_range_pads_by_a_week() {
        let tasks = vec![
            dated(1, "2025-12-01", "2025-12-10"),
            dated(2, "2025-12-08", "2026-01-05"),
            dated(3, "2025-11-01", ""),
        ];
        let range = date_range(&tasks, at_midnight(2000, 1, 1));
        assert_eq!(range.start, at_midnight(2025, 11, 24));
        assert_eq!(range.end, at_midnight(2026, 1, 12));
    }

    #[test]
    fn test_date_range_degenerate_without_dated_tasks() {
        let now = at_midnight(2025, 12, 10);
        let tasks = vec![dated(1, "2025-12-01", ""), dated(2, "bad", "2025-12-03")];
        let range = date_range(&tasks, now);
        assert_eq!(range, DateRange { start: now, end: now });
        assert!(range.is_degenerate());
        assert!(week_ticks(&range).is_empty());

        let pos = task_position(&dated(3, "2025-12-01", "2025-12-05"), &range).unwrap();
        assert_eq!(pos, TaskPosition { left_percent: 0.0, width_percent: 2.0 });
    }

    #[test]
    fn test_date_range_saturates_at_calendar_limits() {
        let tasks = vec![dated(1, "2025-12-01", "+262142-12-30")];
        let range = date_range(&tasks, at_midnight(2025, 12, 10));
        assert_eq!(range.start, at_midnight(2025, 11, 24));
        assert_eq!(range.end, NaiveDateTime::MAX);
        assert!(!range.is_degenerate());

        let ticks = week_ticks(&range);
        assert!(!ticks.is_empty());
        assert!(ticks.len() as i64 <= MAX_WEEK_TICKS);
        assert!(task_position(&tasks[0], &range).is_some());
    }

    #[test]
    fn test_task_position_within_range() {
        let range = DateRange {
            start: at_midnight(2025, 12, 1),
            end: at_midnight(2025, 12, 21),
        };
        let pos = task_position(&dated(1, "2025-12-06", "2025-12-11"), &range).unwrap();
        assert_eq!(pos.left_percent, 25.0);
        assert_eq!(pos.width_percent, 25.0);

        // Same-day task gets the minimum width, early task is clamped to the left edge
        let pos = task_position(&dated(2, "2025-11-20", "2025-11-20"), &range).unwrap();
        assert_eq!(pos.left_percent, 0.0);
        assert_eq!(pos.width_percent, 2.0);

        // No upper clamp
        let pos = task_position(&dated(3, "2025-12-01", "2026-01-10"), &range).unwrap();
        assert!(pos.width_percent > 100.0);

        assert_eq!(task_position(&dated(4, "", "2025-12-10"), &range), None);
    }

    #[test]
    fn test_week_ticks() {
        let range = DateRange {
            start: at_midnight(2025, 12, 1),
            end: at_midnight(2025, 12, 16),
        };
        assert_eq!(
            week_ticks(&range),
            vec![date(2025, 12, 1), date(2025, 12, 8), date(2025, 12, 15)]
        );
    }

    proptest! {
        #[test]
        fn prop_workload_total_is_sum_of_open_mandays(mandays in prop::collection::vec(0u32..200, 0..12)) {
            let tasks: Vec<Task> = mandays
                .iter()
                .enumerate()
                .map(|(i, m)| task(i as u64 + 1, "Alice", "In Progress", f64::from(*m) / 2.0))
                .collect();
            let expected: f64 = tasks.iter().map(|t| t.mandays).sum();
            let w = workload(&tasks, "Alice", 40.0);
            prop_assert_eq!(w.total_mandays, expected);
            prop_assert_eq!(w.tasks.len(), tasks.len());
            if tasks.is_empty() {
                prop_assert_eq!(w.utilization_percent, 0);
                prop_assert_eq!(w.status, WorkloadStatus::Free);
            }
        }
    }
}
