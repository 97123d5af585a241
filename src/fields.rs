//! Enumerations and field types shared by the dashboard views.
//!
//! This module defines the closed sets the views are parameterised by: which column a
//! table is sorted on, which field a filter constrains, how the timeline is grouped and
//! how a developer's workload is classified.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Columns the sheet table can be sorted by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Platform,
    Project,
    Title,
    Dev,
    Status,
    Mandays,
    Priority,
    StartDate,
    EndDate,
}

impl SortField {
    /// Every sortable column, in table order.
    pub const ALL: [SortField; 9] = [
        SortField::Platform,
        SortField::Project,
        SortField::Title,
        SortField::Dev,
        SortField::Status,
        SortField::Mandays,
        SortField::Priority,
        SortField::StartDate,
        SortField::EndDate,
    ];

    /// Column heading.
    pub fn label(self) -> &'static str {
        match self {
            SortField::Platform => "Platform",
            SortField::Project => "Project",
            SortField::Title => "Task",
            SortField::Dev => "Developer",
            SortField::Status => "Status",
            SortField::Mandays => "Days",
            SortField::Priority => "Priority",
            SortField::StartDate => "Start",
            SortField::EndDate => "End",
        }
    }

    /// The column after this one, wrapping around.
    pub fn next(self) -> SortField {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> SortOrder {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn arrow(self) -> &'static str {
        match self {
            SortOrder::Asc => "▲",
            SortOrder::Desc => "▼",
        }
    }
}

/// Fields that accept an exact-match filter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FilterField {
    Platform,
    Project,
    Status,
    Priority,
    Dev,
}

impl FilterField {
    pub const ALL: [FilterField; 5] = [
        FilterField::Platform,
        FilterField::Project,
        FilterField::Status,
        FilterField::Priority,
        FilterField::Dev,
    ];

    /// Label used for the "no constraint" choice, e.g. "All Platforms".
    pub fn all_label(self) -> &'static str {
        match self {
            FilterField::Platform => "All Platforms",
            FilterField::Project => "All Projects",
            FilterField::Status => "All Statuses",
            FilterField::Priority => "All Priorities",
            FilterField::Dev => "All Developers",
        }
    }
}

/// Key the timeline is grouped by.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    #[default]
    Dev,
    Project,
}

impl GroupBy {
    pub fn toggled(self) -> GroupBy {
        match self {
            GroupBy::Dev => GroupBy::Project,
            GroupBy::Project => GroupBy::Dev,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupBy::Dev => "Developer",
            GroupBy::Project => "Project",
        }
    }
}

/// Utilisation classification of a developer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum WorkloadStatus {
    Free,
    Available,
    Overloaded,
}

impl WorkloadStatus {
    /// Classify a utilisation percentage. Upper bounds are inclusive.
    pub fn classify(utilization_percent: f64) -> WorkloadStatus {
        if utilization_percent <= 30.0 {
            WorkloadStatus::Free
        } else if utilization_percent <= 70.0 {
            WorkloadStatus::Available
        } else {
            WorkloadStatus::Overloaded
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkloadStatus::Free => "Free",
            WorkloadStatus::Available => "Available",
            WorkloadStatus::Overloaded => "Overloaded",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            WorkloadStatus::Free => "🟢",
            WorkloadStatus::Available => "🟡",
            WorkloadStatus::Overloaded => "🔴",
        }
    }

    /// One-line explanation shown under a developer's utilisation bar.
    pub fn description(self) -> &'static str {
        match self {
            WorkloadStatus::Free => "Has capacity for new work",
            WorkloadStatus::Available => "Moderately loaded, can take small tasks",
            WorkloadStatus::Overloaded => "At or over capacity",
        }
    }
}

/// Whether a projection has anything to show, and why not.
///
/// `NoData` means the source batch itself is empty for this view; `NoMatches` means
/// there was data but the active filters removed all of it.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ViewState {
    NoData,
    NoMatches,
    Rows,
}

impl ViewState {
    pub fn from_counts(total: usize, shown: usize) -> ViewState {
        if total == 0 {
            ViewState::NoData
        } else if shown == 0 {
            ViewState::NoMatches
        } else {
            ViewState::Rows
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workload_thresholds_are_inclusive() {
        assert_eq!(WorkloadStatus::classify(0.0), WorkloadStatus::Free);
        assert_eq!(WorkloadStatus::classify(30.0), WorkloadStatus::Free);
        assert_eq!(WorkloadStatus::classify(30.25), WorkloadStatus::Available);
        assert_eq!(WorkloadStatus::classify(70.0), WorkloadStatus::Available);
        assert_eq!(WorkloadStatus::classify(70.1), WorkloadStatus::Overloaded);
        assert_eq!(WorkloadStatus::classify(250.0), WorkloadStatus::Overloaded);
    }

    #[test]
    fn test_sort_field_cycle_wraps() {
        assert_eq!(SortField::Platform.next(), SortField::Project);
        assert_eq!(SortField::EndDate.next(), SortField::Platform);
    }

    #[test]
    fn test_view_state_from_counts() {
        assert_eq!(ViewState::from_counts(0, 0), ViewState::NoData);
        assert_eq!(ViewState::from_counts(4, 0), ViewState::NoMatches);
        assert_eq!(ViewState::from_counts(4, 2), ViewState::Rows);
    }
}
