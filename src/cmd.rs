//! Command implementations for the CLI interface.
//!
//! Every handler loads one [`Board`], projects it through the pure view functions and
//! prints either a text rendering or JSON.

use std::io::{self, IsTerminal};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use crossterm::style::Stylize;
use serde::Serialize;

use crate::board::*;
use crate::cli::Cli;
use crate::fields::*;
use crate::group::group_tasks;
use crate::metrics::{date_range, is_overdue, task_position, timeline_tasks, week_ticks, workload_report, DateRange, TaskPosition};
use crate::task::Task;
use crate::tui::run::{run_tui, DashboardConfig};
use crate::view::{view, Filters, ViewQuery};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive dashboard.
    Ui,

    /// Print the task sheet with optional filters.
    Sheet {
        /// Filter by platform (exact match).
        #[arg(long)]
        platform: Option<String>,
        /// Filter by project (exact match).
        #[arg(long)]
        project: Option<String>,
        /// Filter by status (exact match).
        #[arg(long)]
        status: Option<String>,
        /// Filter by priority (exact match), e.g. P0.
        #[arg(long)]
        priority: Option<String>,
        /// Filter by developer (exact match).
        #[arg(long)]
        dev: Option<String>,
        /// Case-insensitive search over title, project, developer and blocker.
        #[arg(long)]
        search: Option<String>,
        /// Sort column.
        #[arg(long, value_enum, default_value_t = SortField::StartDate)]
        sort: SortField,
        /// Sort descending.
        #[arg(long)]
        desc: bool,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print a Gantt-style timeline of dated tasks.
    Timeline {
        /// Group lanes by developer or project.
        #[arg(long, value_enum, default_value_t = GroupBy::Dev)]
        group_by: GroupBy,
        /// Show only group headers.
        #[arg(long)]
        collapsed: bool,
        /// Width of the bar area in columns.
        #[arg(long, default_value_t = 60)]
        width: usize,
        /// Print JSON instead of bars.
        #[arg(long)]
        json: bool,
    },

    /// Show each developer's workload against weekly capacity.
    Workload {
        /// Print JSON instead of bars.
        #[arg(long)]
        json: bool,
    },

    /// View a single task by ID.
    View {
        /// Task ID (1-based row index in the sheet).
        id: u64,
        /// Print JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_board(cli: &Cli) -> Board {
    let board = Board::load(&cli.source(), cli.timeout());
    if let Origin::Demo { reason } = &board.origin {
        eprintln!("Showing demo data: {reason}");
    }
    board
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialise output")?;
    println!("{out}");
    Ok(())
}

/// Launch the terminal user interface.
pub fn cmd_ui(cli: &Cli) -> Result<()> {
    let config = DashboardConfig {
        source: cli.source(),
        timeout: cli.timeout(),
        refresh: cli.refresh_interval(),
        capacity: cli.capacity,
    };
    run_tui(config).context("dashboard terminated with an error")
}

/// List tasks with optional filtering and sorting.
pub fn cmd_sheet(
    cli: &Cli,
    filters: Filters,
    search: Option<String>,
    sort: SortField,
    desc: bool,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let board = load_board(cli);
    let query = ViewQuery {
        filters,
        search: search.unwrap_or_default(),
        sort_field: sort,
        sort_order: if desc { SortOrder::Desc } else { SortOrder::Asc },
    };
    let mut table = view(&board.tasks, &query);
    if let Some(n) = limit {
        table.rows.truncate(n);
    }

    if json {
        return print_json(&table);
    }
    match table.state {
        ViewState::NoData => println!("No tasks found."),
        ViewState::NoMatches => println!("No tasks match the current filters."),
        ViewState::Rows => {
            print_table(&table.rows);
            println!("\n{} of {} tasks", table.rows.len(), table.total);
        }
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineBar<'a> {
    #[serde(flatten)]
    task: &'a Task,
    position: TaskPosition,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineLane<'a> {
    key: &'a str,
    bars: Vec<TimelineBar<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineJson<'a> {
    state: ViewState,
    group_by: GroupBy,
    range: DateRange,
    lanes: Vec<TimelineLane<'a>>,
}

/// Print the timeline grouped by developer or project.
pub fn cmd_timeline(cli: &Cli, group_by: GroupBy, collapsed: bool, width: usize, json: bool) -> Result<()> {
    let board = load_board(cli);
    let dated = timeline_tasks(&board.tasks);
    let range = date_range(dated.iter().copied(), Local::now().naive_local());
    let groups = group_tasks(dated.iter().copied(), group_by);
    let state = ViewState::from_counts(board.tasks.len(), dated.len());

    if json {
        let lanes = groups
            .iter()
            .map(|g| TimelineLane {
                key: &g.key,
                bars: g
                    .tasks
                    .iter()
                    .filter_map(|&t| task_position(t, &range).map(|position| TimelineBar { task: t, position }))
                    .collect(),
            })
            .collect();
        return print_json(&TimelineJson { state, group_by, range, lanes });
    }

    match state {
        ViewState::NoData => {
            println!("No tasks found.");
            return Ok(());
        }
        ViewState::NoMatches => {
            println!("No tasks with both a start and end date.");
            return Ok(());
        }
        ViewState::Rows => {}
    }

    const LABEL: usize = 28;
    println!(
        "Timeline by {}: {} to {} ({} days)",
        group_by.label(),
        range.start.format("%b %-d, %Y"),
        range.end.format("%b %-d, %Y"),
        range.days()
    );
    println!("{:w$} {}", "", render_week_header(&range, &week_ticks(&range), width), w = LABEL);

    for group in &groups {
        let key = if group.key.is_empty() { "(none)" } else { group.key.as_str() };
        let marker = if collapsed { "▶" } else { "▼" };
        println!("{marker} {key} ({} tasks)", group.tasks.len());
        if collapsed {
            continue;
        }
        for task in &group.tasks {
            if let Some(pos) = task_position(task, &range) {
                println!("  {:<w$} {}", truncate(&task.title, LABEL - 2), render_bar(&pos, width), w = LABEL - 2);
            }
        }
    }
    Ok(())
}

/// Print each developer's utilisation.
pub fn cmd_workload(cli: &Cli, json: bool) -> Result<()> {
    let board = load_board(cli);
    let report = workload_report(&board.tasks, cli.capacity);

    if json {
        return print_json(&report);
    }
    if report.state == ViewState::NoData {
        println!("No developers assigned.");
        return Ok(());
    }

    println!(
        "Team workload (capacity {} mandays/week)",
        format_mandays(report.capacity)
    );
    println!(
        "{} developers, {} active tasks | {} free, {} available, {} overloaded | avg {}%\n",
        report.summary.developers,
        report.summary.active_tasks,
        report.summary.free,
        report.summary.available,
        report.summary.overloaded,
        report.summary.average_utilization
    );

    const BAR: usize = 20;
    for w in &report.entries {
        let filled = ((w.utilization_percent.clamp(0, 100) as usize) * BAR + 50) / 100;
        println!(
            "{} {:<12} [{}{}] {:>4}%  {:>5}/{} mandays  {} tasks  {}",
            w.emoji,
            truncate(&w.dev, 12),
            "█".repeat(filled),
            "░".repeat(BAR - filled),
            w.utilization_percent,
            format_mandays(w.total_mandays),
            format_mandays(report.capacity),
            w.tasks.len(),
            w.status.label(),
        );
    }

    if !report.idle.is_empty() {
        println!("\nNo open work: {}", report.idle.join(", "));
    }
    Ok(())
}

/// View detailed information about a specific task.
pub fn cmd_view(cli: &Cli, id: u64, json: bool) -> Result<()> {
    let board = load_board(cli);
    let Some(task) = board.get(id) else {
        bail!("Task {id} not found.");
    };
    if json {
        return print_json(task);
    }

    let today = Local::now().date_naive();
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    println!("ID:             {}", task.id);
    println!("Task:           {}", or_dash(&task.title));
    println!("Platform:       {}", or_dash(&task.platform));
    println!("Project:        {}", or_dash(&task.project));
    println!("Developer:      {}", or_dash(&task.dev));
    println!("Status:         {}", task.status);
    println!("Priority:       {}", task.priority);
    println!("Mandays:        {}", format_mandays(task.mandays));
    println!("Start:          {}", or_dash(&format_date(&task.start_date)));
    println!("End:            {}", or_dash(&format_date(&task.end_date)));
    let days = format_days_remaining(&task.end_date, today);
    if is_overdue(&task.end_date, today) && io::stdout().is_terminal() {
        println!("Days remaining: {}", days.red());
    } else {
        println!("Days remaining: {days}");
    }
    println!("Go-live:        {}", or_dash(&format_date(&task.go_live_date)));
    println!("Blocker:        {}", or_dash(&task.blocker));
    println!("Impact:         {}", or_dash(&task.impact));
    Ok(())
}

/// Generate shell completion scripts for the specified shell.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
