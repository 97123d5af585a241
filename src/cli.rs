use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::cmd::Commands;
use crate::metrics::DEFAULT_WEEKLY_CAPACITY;
use crate::source::{SheetConfig, Source};

/// Read-only dashboard over a team's task spreadsheet.
/// Tasks come from a published Google Sheet, a CSV file, or stdin (`--file -`).
#[derive(Parser)]
#[command(name = "taskboard", version, about = "Task sheet, timeline and workload dashboard")]
pub struct Cli {
    /// Read tasks from a CSV file instead of the sheet ("-" for stdin).
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,

    /// Google Sheet ID (the long token in the sheet URL).
    #[arg(long, global = true, env = "TASKBOARD_SHEET_ID")]
    pub sheet_id: Option<String>,

    /// Tab gid within the sheet.
    #[arg(long, global = true, env = "TASKBOARD_SHEET_GID")]
    pub gid: Option<String>,

    /// Tab name within the sheet; used when no gid is given.
    #[arg(long, global = true, env = "TASKBOARD_SHEET_NAME")]
    pub sheet_name: Option<String>,

    /// Weekly capacity per developer, in mandays.
    #[arg(long, global = true, env = "TASKBOARD_CAPACITY", default_value_t = DEFAULT_WEEKLY_CAPACITY)]
    pub capacity: f64,

    /// Seconds between automatic refetches in the UI.
    #[arg(long, global = true, env = "TASKBOARD_REFRESH_SECS", default_value_t = 30)]
    pub refresh: u64,

    /// HTTP timeout in seconds.
    #[arg(long, global = true, env = "TASKBOARD_TIMEOUT_SECS", default_value_t = 15)]
    pub timeout: u64,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The configured sheet, if a sheet ID was given.
    pub fn sheet(&self) -> Option<SheetConfig> {
        let sheet_id = self.sheet_id.as_ref().filter(|s| !s.trim().is_empty())?;
        Some(SheetConfig {
            sheet_id: sheet_id.trim().to_string(),
            gid: self.gid.clone().filter(|g| !g.trim().is_empty()),
            sheet_name: self.sheet_name.clone().filter(|n| !n.trim().is_empty()),
        })
    }

    pub fn source(&self) -> Source {
        Source::select(self.file.clone(), self.sheet())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_file_overrides_sheet() {
        let cli = Cli::try_parse_from([
            "taskboard",
            "--sheet-id",
            "abc",
            "--file",
            "tasks.csv",
            "sheet",
        ])
        .unwrap();
        assert_eq!(cli.source(), Source::File("tasks.csv".into()));
    }

    #[test]
    fn test_sheet_options() {
        let cli = Cli::try_parse_from([
            "taskboard",
            "workload",
            "--sheet-id",
            "abc",
            "--sheet-name",
            "Q1",
            "--capacity",
            "20",
        ])
        .unwrap();
        assert_eq!(
            cli.sheet(),
            Some(SheetConfig {
                sheet_id: "abc".into(),
                gid: None,
                sheet_name: Some("Q1".into()),
            })
        );
        assert_eq!(cli.capacity, 20.0);
    }

    #[test]
    fn test_blank_sheet_id_is_unconfigured() {
        let cli = Cli::try_parse_from(["taskboard", "--sheet-id", "  ", "sheet"]).unwrap();
        assert_eq!(cli.sheet(), None);
    }
}
