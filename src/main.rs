//! # Taskboard - read-only task dashboard
//!
//! A command-line and terminal dashboard over a team's task spreadsheet. Tasks are pulled
//! from a Google Sheet published as CSV (or a local CSV file) and shown three ways:
//!
//! - **Sheet**: the task table with exact-match filters, free-text search and sorting
//! - **Timeline**: Gantt-style bars grouped by developer or project
//! - **Workload**: each developer's open mandays against weekly capacity
//!
//! Nothing is ever written back. Every load produces a fresh, immutable batch of tasks and
//! all views are recomputed from it. When the sheet cannot be read a small demo dataset is
//! shown instead, together with the reason.
//!
//! ## Quick Start
//!
//! ```bash
//! # Point at a published sheet
//! export TASKBOARD_SHEET_ID=1AbC...xyz
//!
//! # Interactive dashboard (refreshes every 30s)
//! taskboard ui
//!
//! # Blocked P0 work
//! taskboard sheet --status Blocked --priority P0
//!
//! # Timeline by project, from a local export
//! taskboard --file tasks.csv timeline --group-by project
//!
//! # Workload as JSON
//! taskboard workload --json
//! ```
//!
//! ## Sheet layout
//!
//! The first row holds headers. Recognised columns are Platform, Project, Task (or Title),
//! Dev (or Assigned Dev / Developer), Status, Mandays (or Man Days), Priority, Start Date,
//! End Date, Blocker, Go-Live (or Go Live Date) and Impact. Missing cells fall back to
//! sensible defaults (status Backlog, priority P2, zero mandays).

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub mod board;
pub mod cli;
pub mod cmd;
pub mod error;
pub mod fields;
pub mod group;
pub mod metrics;
pub mod normalize;
pub mod parser;
pub mod source;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use view::Filters;

/// Install the log subscriber.
///
/// `RUST_LOG` wins; otherwise the level is `warn`, raised by each `-v`. The dashboard owns
/// the terminal, so it only logs when a log file is given.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if let Some(path) = &cli.log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init();
    } else if !matches!(cli.command, Commands::Ui) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    init_logging(&cli)?;

    match &cli.command {
        Commands::Ui => cmd_ui(&cli),
        Commands::Sheet {
            platform,
            project,
            status,
            priority,
            dev,
            search,
            sort,
            desc,
            limit,
            json,
        } => {
            let filters = Filters {
                platform: platform.clone(),
                project: project.clone(),
                status: status.clone(),
                priority: priority.clone(),
                dev: dev.clone(),
            };
            cmd_sheet(&cli, filters, search.clone(), *sort, *desc, *limit, *json)
        }
        Commands::Timeline {
            group_by,
            collapsed,
            width,
            json,
        } => cmd_timeline(&cli, *group_by, *collapsed, *width, *json),
        Commands::Workload { json } => cmd_workload(&cli, *json),
        Commands::View { id, json } => cmd_view(&cli, *id, *json),
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
