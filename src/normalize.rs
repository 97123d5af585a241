//! Mapping of loosely-typed sheet rows onto canonical [`Task`] records.
//!
//! Column names in a shared sheet drift ("Go-Live", "GO_LIVE", "Assigned Dev"), so each
//! canonical field carries an ordered alias list and a default. Resolution never fails:
//! a missing or malformed cell degrades to the field's default.

use crate::parser::Record;
use crate::task::Task;

pub const DEFAULT_STATUS: &str = "Backlog";
pub const DEFAULT_PRIORITY: &str = "P2";
pub const DEFAULT_MANDAYS: f64 = 0.0;

/// Canonical task columns as they appear in the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Platform,
    Project,
    Title,
    Dev,
    Status,
    Mandays,
    Priority,
    StartDate,
    EndDate,
    Blocker,
    GoLive,
    Impact,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::Platform,
        Column::Project,
        Column::Title,
        Column::Dev,
        Column::Status,
        Column::Mandays,
        Column::Priority,
        Column::StartDate,
        Column::EndDate,
        Column::Blocker,
        Column::GoLive,
        Column::Impact,
    ];

    /// Accepted header spellings, preferred first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Platform => &["Platform"],
            Column::Project => &["Project"],
            Column::Title => &["Task", "Title"],
            Column::Dev => &["Dev", "Assigned Dev", "Developer"],
            Column::Status => &["Status"],
            Column::Mandays => &["Mandays", "Man Days"],
            Column::Priority => &["Priority"],
            Column::StartDate => &["Start Date"],
            Column::EndDate => &["End Date"],
            Column::Blocker => &["Blocker"],
            Column::GoLive => &["Go-Live", "Go Live Date"],
            Column::Impact => &["Impact"],
        }
    }

    /// Value used when no alias resolves to a non-empty cell.
    pub fn default_value(self) -> &'static str {
        match self {
            Column::Status => DEFAULT_STATUS,
            Column::Priority => DEFAULT_PRIORITY,
            _ => "",
        }
    }

    /// Header text a sheet is expected to carry.
    pub fn header(self) -> &'static str {
        self.aliases()[0]
    }
}

/// Preferred header of every recognised column, comma separated.
pub fn expected_headers() -> String {
    Column::ALL.iter().map(|c| c.header()).collect::<Vec<_>>().join(", ")
}

/// Fold a header for tolerant comparison: case, `-`, `_` and repeated spaces are ignored.
fn fold_header(header: &str) -> String {
    header
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve the first non-empty value for `column`.
///
/// Exact spellings are tried first, in alias order; then the same aliases are compared
/// against folded headers so that `GO_LIVE` or `start date` still match.
pub fn lookup(record: &Record, column: Column) -> Option<&str> {
    let aliases = column.aliases();
    for alias in aliases {
        if let Some(value) = record.get(alias).filter(|v| !v.is_empty()) {
            return Some(value);
        }
    }
    for alias in aliases {
        let wanted = fold_header(alias);
        let found = record
            .columns()
            .find(|(name, value)| !value.is_empty() && fold_header(name) == wanted)
            .map(|(_, value)| value);
        if found.is_some() {
            return found;
        }
    }
    None
}

fn text(record: &Record, column: Column) -> String {
    lookup(record, column)
        .unwrap_or_else(|| column.default_value())
        .to_string()
}

/// Lenient numeric parse: reads the longest leading decimal number, so `"2.5 days"`
/// yields 2.5. Anything unparsable, negative or non-finite becomes `0`.
pub fn parse_mandays(raw: &str) -> f64 {
    let s = raw.trim();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return DEFAULT_MANDAYS;
    }
    // Optional exponent, only taken when complete
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => v,
        _ => DEFAULT_MANDAYS,
    }
}

/// Build one task from one record.
pub fn normalize_record(record: &Record, id: u64) -> Task {
    Task {
        id,
        platform: text(record, Column::Platform),
        project: text(record, Column::Project),
        title: text(record, Column::Title),
        dev: text(record, Column::Dev),
        status: text(record, Column::Status),
        mandays: lookup(record, Column::Mandays)
            .map(parse_mandays)
            .unwrap_or(DEFAULT_MANDAYS),
        priority: text(record, Column::Priority),
        start_date: text(record, Column::StartDate),
        end_date: text(record, Column::EndDate),
        blocker: text(record, Column::Blocker),
        go_live_date: text(record, Column::GoLive),
        impact: text(record, Column::Impact),
    }
}

/// Normalise a batch of records. Ids are `start_index`, `start_index + 1`, ... in input order.
pub fn normalize(records: &[Record], start_index: u64) -> Vec<Task> {
    records
        .iter()
        .zip(start_index..)
        .map(|(record, id)| normalize_record(record, id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, &str)]) -> Record {
        Record::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_expected_headers_lists_preferred_spellings() {
        let headers = expected_headers();
        assert!(headers.starts_with("Platform, Project, Task, Dev"));
        assert!(headers.ends_with("Go-Live, Impact"));
    }

    #[test]
    fn test_end_to_end_single_row() {
        let rows = parse("Platform,Task,Dev,Status,Mandays,Priority\nWebsite,Fix bug,Alice,In Progress,2.5,P1\n");
        let tasks = normalize(&rows, 1);
        assert_eq!(
            tasks,
            vec![Task {
                id: 1,
                platform: "Website".into(),
                project: String::new(),
                title: "Fix bug".into(),
                dev: "Alice".into(),
                status: "In Progress".into(),
                mandays: 2.5,
                priority: "P1".into(),
                start_date: String::new(),
                end_date: String::new(),
                blocker: String::new(),
                go_live_date: String::new(),
                impact: String::new(),
            }]
        );
    }

    #[test]
    fn test_missing_columns_take_defaults() {
        let task = normalize_record(&record(&[("Task", "Write docs")]), 7);
        assert_eq!(task.id, 7);
        assert_eq!(task.priority, "P2");
        assert_eq!(task.status, "Backlog");
        assert_eq!(task.mandays, 0.0);
        assert_eq!(task.dev, "");
    }

    #[test]
    fn test_blank_cells_fall_back_to_defaults() {
        let task = normalize_record(&record(&[("Status", ""), ("Priority", "")]), 1);
        assert_eq!(task.status, "Backlog");
        assert_eq!(task.priority, "P2");
    }

    #[test]
    fn test_unparsable_mandays_is_zero() {
        let task = normalize_record(&record(&[("Mandays", "abc")]), 1);
        assert_eq!(task.mandays, 0.0);
    }

    #[test]
    fn test_parse_mandays_variants() {
        assert_eq!(parse_mandays("3"), 3.0);
        assert_eq!(parse_mandays(" 2.5 "), 2.5);
        assert_eq!(parse_mandays("4 days"), 4.0);
        assert_eq!(parse_mandays(".5"), 0.5);
        assert_eq!(parse_mandays("1e1"), 10.0);
        assert_eq!(parse_mandays("2e"), 2.0);
        assert_eq!(parse_mandays("-3"), 0.0);
        assert_eq!(parse_mandays("."), 0.0);
        assert_eq!(parse_mandays(""), 0.0);
        assert_eq!(parse_mandays("NaN"), 0.0);
    }

    #[test]
    fn test_alternate_spellings_resolve() {
        let task = normalize_record(
            &record(&[
                ("PLATFORM", "App"),
                ("Assigned Dev", "Bob"),
                ("GO_LIVE", "2026-01-10"),
                ("start_date", "2025-12-20"),
                ("End-Date", "2026-01-05"),
                ("MANDAYS", "8"),
            ]),
            1,
        );
        assert_eq!(task.platform, "App");
        assert_eq!(task.dev, "Bob");
        assert_eq!(task.go_live_date, "2026-01-10");
        assert_eq!(task.start_date, "2025-12-20");
        assert_eq!(task.end_date, "2026-01-05");
        assert_eq!(task.mandays, 8.0);
    }

    #[test]
    fn test_exact_alias_order_wins_over_folded_match() {
        let task = normalize_record(&record(&[("DEV", "Folded"), ("Assigned Dev", "Exact")]), 1);
        assert_eq!(task.dev, "Exact");

        let task = normalize_record(&record(&[("Dev", ""), ("DEV", "Upper")]), 1);
        assert_eq!(task.dev, "Upper");
    }

    #[test]
    fn test_ids_follow_input_order() {
        let rows = vec![record(&[("Task", "a")]), record(&[("Task", "b")]), record(&[("Task", "c")])];
        let ids: Vec<u64> = normalize(&rows, 10).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }
}
