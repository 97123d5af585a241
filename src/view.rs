//! Filtering, searching and sorting of the sheet table.
//!
//! The table is a pure projection of the task batch: a [`ViewQuery`] snapshot goes in,
//! an ordered list of borrowed tasks comes out. The batch itself is never touched.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::fields::{FilterField, SortField, SortOrder, ViewState};
use crate::metrics::parse_date;
use crate::task::{priority_rank, Task};

/// Exact-match constraints, one optional value per filterable field.
///
/// `None` and `Some("")` both mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub platform: Option<String>,
    pub project: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub dev: Option<String>,
}

impl Filters {
    fn slot(&self, field: FilterField) -> &Option<String> {
        match field {
            FilterField::Platform => &self.platform,
            FilterField::Project => &self.project,
            FilterField::Status => &self.status,
            FilterField::Priority => &self.priority,
            FilterField::Dev => &self.dev,
        }
    }

    fn slot_mut(&mut self, field: FilterField) -> &mut Option<String> {
        match field {
            FilterField::Platform => &mut self.platform,
            FilterField::Project => &mut self.project,
            FilterField::Status => &mut self.status,
            FilterField::Priority => &mut self.priority,
            FilterField::Dev => &mut self.dev,
        }
    }

    /// Active constraint for `field`, if any.
    pub fn get(&self, field: FilterField) -> Option<&str> {
        self.slot(field).as_deref().filter(|v| !v.is_empty())
    }

    pub fn set(&mut self, field: FilterField, value: Option<String>) {
        *self.slot_mut(field) = value.filter(|v| !v.is_empty());
    }

    #[cfg(test)]
    pub fn with(mut self, field: FilterField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    pub fn is_active(&self) -> bool {
        FilterField::ALL.iter().any(|f| self.get(*f).is_some())
    }

    pub fn clear(&mut self) {
        *self = Filters::default();
    }

    /// Every active constraint holds for `task`.
    pub fn matches(&self, task: &Task) -> bool {
        FilterField::ALL.iter().all(|&field| match self.get(field) {
            Some(wanted) => field_value(task, field) == wanted,
            None => true,
        })
    }
}

/// Raw value of a filterable field.
pub fn field_value(task: &Task, field: FilterField) -> &str {
    match field {
        FilterField::Platform => &task.platform,
        FilterField::Project => &task.project,
        FilterField::Status => &task.status,
        FilterField::Priority => &task.priority,
        FilterField::Dev => &task.dev,
    }
}

/// Case-insensitive substring match on title, project, dev or blocker.
pub fn matches_search(task: &Task, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    [&task.title, &task.project, &task.dev, &task.blocker]
        .iter()
        .any(|haystack| haystack.to_lowercase().contains(&needle))
}

/// Everything the table needs to know to project the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    pub filters: Filters,
    pub search: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for ViewQuery {
    fn default() -> Self {
        ViewQuery {
            filters: Filters::default(),
            search: String::new(),
            sort_field: SortField::StartDate,
            sort_order: SortOrder::Asc,
        }
    }
}

impl ViewQuery {
    /// Clicking a column: same column flips the order, a new column starts ascending.
    pub fn sort_by(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Asc;
        }
    }
}

/// Result of projecting a batch through a [`ViewQuery`].
#[derive(Debug, Clone, Serialize)]
pub struct TableView<'a> {
    pub state: ViewState,
    pub total: usize,
    pub rows: Vec<&'a Task>,
}

/// Tasks passing every filter and the search, in input order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filters: &Filters, search: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| matches_search(t, search) && filters.matches(t))
        .collect()
}

fn date_key(raw: &str) -> NaiveDateTime {
    parse_date(raw).unwrap_or(NaiveDateTime::MIN)
}

/// Compare two tasks on one column in ascending order.
///
/// Mandays compare numerically, dates by parsed instant with unset/unparsable dates
/// first, everything else by the raw string.
pub fn compare(a: &Task, b: &Task, field: SortField) -> Ordering {
    match field {
        SortField::Mandays => a.mandays.partial_cmp(&b.mandays).unwrap_or(Ordering::Equal),
        SortField::StartDate => date_key(&a.start_date).cmp(&date_key(&b.start_date)),
        SortField::EndDate => date_key(&a.end_date).cmp(&date_key(&b.end_date)),
        SortField::Platform => a.platform.cmp(&b.platform),
        SortField::Project => a.project.cmp(&b.project),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Dev => a.dev.cmp(&b.dev),
        SortField::Status => a.status.cmp(&b.status),
        SortField::Priority => a.priority.cmp(&b.priority),
    }
}

/// Stable sort; equal keys keep their relative input order in both directions.
pub fn sort_tasks(rows: &mut [&Task], field: SortField, order: SortOrder) {
    rows.sort_by(|a, b| {
        let ord = compare(a, b, field);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

/// Filter, search and sort the batch.
pub fn view<'a>(tasks: &'a [Task], query: &ViewQuery) -> TableView<'a> {
    let mut rows = filter_tasks(tasks, &query.filters, &query.search);
    sort_tasks(&mut rows, query.sort_field, query.sort_order);
    TableView {
        state: ViewState::from_counts(tasks.len(), rows.len()),
        total: tasks.len(),
        rows,
    }
}

/// Sorted distinct non-empty values of `field`, used as filter choices.
///
/// Priorities follow their rank (P0 first), with unrecognised values after them.
pub fn distinct_values(tasks: &[Task], field: FilterField) -> Vec<String> {
    let mut values: Vec<String> = tasks
        .iter()
        .map(|t| field_value(t, field))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if field == FilterField::Priority {
        values.sort_by_key(|p| priority_rank(p).unwrap_or(usize::MAX));
    }
    values
}

/// Next choice after `current` for `field`, cycling through "all" (`None`).
pub fn next_filter_value(tasks: &[Task], field: FilterField, current: Option<&str>) -> Option<String> {
    let choices = distinct_values(tasks, field);
    match current.and_then(|c| choices.iter().position(|v| v == c)) {
        None => choices.first().cloned(),
        Some(idx) => choices.get(idx + 1).cloned(),
    }
}
