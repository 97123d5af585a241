//! Task data structure and related functionality.
//!
//! This module defines the canonical `Task` record that every view consumes. A task is
//! built once per fetch by the normaliser and never mutated afterwards; views only borrow it.

use serde::{Deserialize, Serialize};

/// Status values the dashboard knows how to style. Any other string is kept as-is.
pub const STATUS_BACKLOG: &str = "Backlog";
pub const STATUS_IN_PROGRESS: &str = "In Progress";
pub const STATUS_BLOCKED: &str = "Blocked";
pub const STATUS_COMPLETED: &str = "Completed";

/// Recognised priorities, highest first.
pub const KNOWN_PRIORITIES: [&str; 4] = ["P0", "P1", "P2", "P3"];

/// A single unit of work normalised from one spreadsheet row.
///
/// Every string field is always present (possibly empty). Dates are kept in the
/// representation the sheet provided and parsed on demand by the metrics engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub platform: String,
    pub project: String,
    pub title: String,
    pub dev: String,
    pub status: String,
    pub mandays: f64,
    pub priority: String,
    pub start_date: String,
    pub end_date: String,
    pub blocker: String,
    pub go_live_date: String,
    pub impact: String,
}

impl Task {
    /// Whether the task counts as finished for workload purposes.
    pub fn is_completed(&self) -> bool {
        self.status == STATUS_COMPLETED
    }
}

/// Position of `priority` within [`KNOWN_PRIORITIES`].
pub fn priority_rank(priority: &str) -> Option<usize> {
    KNOWN_PRIORITIES.iter().position(|p| *p == priority)
}
