//! Where the raw CSV comes from.
//!
//! A board is fed either by a published Google Sheet (CSV export endpoint), a local file
//! or stdin. This module only produces text; it never normalises. It also owns the fixed
//! demonstration batch shown whenever no usable payload is available.

use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::error::SourceError;
use crate::task::Task;

const SHEETS_BASE: &str = "https://docs.google.com/spreadsheets/d";

/// A published spreadsheet tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetConfig {
    pub sheet_id: String,
    pub gid: Option<String>,
    pub sheet_name: Option<String>,
}

impl SheetConfig {
    /// CSV export URL. A tab gid wins over a tab name; with neither the first tab is used.
    pub fn csv_url(&self) -> String {
        match (&self.gid, &self.sheet_name) {
            (Some(gid), _) => format!("{SHEETS_BASE}/{}/export?format=csv&gid={gid}", self.sheet_id),
            (None, Some(name)) => format!(
                "{SHEETS_BASE}/{}/gviz/tq?tqx=out:csv&sheet={}",
                self.sheet_id,
                urlencoding::encode(name)
            ),
            (None, None) => format!("{SHEETS_BASE}/{}/export?format=csv&gid=0", self.sheet_id),
        }
    }

    /// Link to the human-facing sheet.
    pub fn edit_url(&self) -> String {
        format!("{SHEETS_BASE}/{}/edit", self.sheet_id)
    }
}

/// Input selection for one load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    File(PathBuf),
    Stdin,
    Sheet(SheetConfig),
    Unconfigured,
}

impl Source {
    /// Local input takes precedence over a configured sheet.
    pub fn select(file: Option<PathBuf>, sheet: Option<SheetConfig>) -> Source {
        match (file, sheet) {
            (Some(path), _) if path.as_os_str() == "-" => Source::Stdin,
            (Some(path), _) => Source::File(path),
            (None, Some(sheet)) => Source::Sheet(sheet),
            (None, None) => Source::Unconfigured,
        }
    }

    /// Short human description, e.g. for the status bar.
    pub fn describe(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Stdin => "stdin".to_string(),
            Source::Sheet(sheet) => sheet.edit_url(),
            Source::Unconfigured => "demo data".to_string(),
        }
    }
}

/// The payload is markup rather than delimited text, which is what an unpublished sheet returns.
pub fn looks_like_markup(text: &str) -> bool {
    let head: String = text.trim_start().chars().take(9).collect::<String>().to_ascii_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn fetch_sheet(sheet: &SheetConfig, timeout: Duration) -> Result<String, SourceError> {
    let url = sheet.csv_url();
    info!(url = %url, "fetching sheet");

    let http_err = |source| SourceError::Http {
        url: url.clone(),
        source,
    };
    let client = Client::builder().timeout(timeout).build().map_err(http_err)?;
    let response = client.get(&url).send().map_err(http_err)?;
    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
        });
    }
    response.text().map_err(http_err)
}

/// Read the raw payload for `source`.
///
/// Markup payloads are rejected with [`SourceError::NotPublished`] so they never reach
/// the parser.
pub fn fetch_text(source: &Source, timeout: Duration) -> Result<String, SourceError> {
    let text = match source {
        Source::File(path) => std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.clone(),
            source: e,
        })?,
        Source::Stdin => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| SourceError::Io {
                    path: PathBuf::from("-"),
                    source: e,
                })?;
            buf
        }
        Source::Sheet(sheet) => fetch_sheet(sheet, timeout)?,
        Source::Unconfigured => return Err(SourceError::NotConfigured),
    };

    let preview: String = text.chars().take(200).collect();
    debug!(bytes = text.len(), preview = %preview, "payload received");

    if looks_like_markup(&text) {
        return Err(SourceError::NotPublished);
    }
    Ok(text)
}

/// The fixed demonstration batch substituted when the sheet cannot be used.
pub fn demo_tasks() -> Vec<Task> {
    vec![
        Task {
            id: 1,
            platform: "Website".into(),
            project: "Dashboard Redesign".into(),
            title: "Create new landing page".into(),
            dev: "Alice".into(),
            status: "In Progress".into(),
            mandays: 5.0,
            priority: "P0".into(),
            start_date: "2025-12-01".into(),
            end_date: "2025-12-10".into(),
            blocker: String::new(),
            go_live_date: "2025-12-15".into(),
            impact: "Increase conversion rate by 20%".into(),
        },
        Task {
            id: 2,
            platform: "App".into(),
            project: "Mobile App v2".into(),
            title: "Implement authentication flow".into(),
            dev: "Bob".into(),
            status: "Backlog".into(),
            mandays: 8.0,
            priority: "P0".into(),
            start_date: "2025-12-20".into(),
            end_date: "2026-01-05".into(),
            blocker: String::new(),
            go_live_date: "2026-01-10".into(),
            impact: "Core feature for app launch".into(),
        },
        Task {
            id: 3,
            platform: "Backend".into(),
            project: "API Optimization".into(),
            title: "Database query optimization".into(),
            dev: "Charlie".into(),
            status: "In Progress".into(),
            mandays: 3.0,
            priority: "P1".into(),
            start_date: "2025-12-08".into(),
            end_date: "2025-12-15".into(),
            blocker: "Waiting for performance metrics from ops".into(),
            go_live_date: "2025-12-18".into(),
            impact: "Reduce API response time by 40%".into(),
        },
        Task {
            id: 4,
            platform: "Website".into(),
            project: "Dashboard Redesign".into(),
            title: "Payment integration".into(),
            dev: "Alice".into(),
            status: "Blocked".into(),
            mandays: 4.0,
            priority: "P0".into(),
            start_date: "2025-12-12".into(),
            end_date: "2025-12-20".into(),
            blocker: "Waiting for payment provider API docs".into(),
            go_live_date: "2025-12-22".into(),
            impact: "Enable transactions".into(),
        },
        Task {
            id: 5,
            platform: "Infra".into(),
            project: "Infrastructure".into(),
            title: "Setup CI/CD pipeline".into(),
            dev: "David".into(),
            status: "Completed".into(),
            mandays: 6.0,
            priority: "P0".into(),
            start_date: "2025-11-20".into(),
            end_date: "2025-12-05".into(),
            blocker: String::new(),
            go_live_date: "2025-12-05".into(),
            impact: "Automate deployment process".into(),
        },
    ]
}
