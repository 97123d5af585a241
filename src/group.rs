//! Partitioning of tasks into timeline groups.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::fields::GroupBy;
use crate::task::Task;

/// One timeline lane: a key and its tasks in input order.
#[derive(Debug, Clone, Serialize)]
pub struct TaskGroup<'a> {
    pub key: String,
    pub tasks: Vec<&'a Task>,
}

/// The grouping key of `task`.
pub fn group_key(task: &Task, by: GroupBy) -> &str {
    match by {
        GroupBy::Dev => &task.dev,
        GroupBy::Project => &task.project,
    }
}

/// Locale-style key order: case-insensitive first, then lowercase before uppercase between
/// keys that differ only in case.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

/// Group tasks by developer or project. Groups are ordered by key; members keep their
/// relative input order. Tasks with an empty key form their own `""` group.
pub fn group_tasks<'a, I>(tasks: I, by: GroupBy) -> Vec<TaskGroup<'a>>
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<TaskGroup<'a>> = Vec::new();

    for task in tasks {
        let key = group_key(task, by);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(TaskGroup {
                key: key.to_string(),
                tasks: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].tasks.push(task);
    }

    groups.sort_by(|a, b| compare_keys(&a.key, &b.key));
    groups
}
