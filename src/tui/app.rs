//! Main application logic for the terminal dashboard.
//!
//! This module contains the `App` struct which holds the current board, the UI-only
//! state (tab, selection, filters, collapsed timeline groups) and the key handling and
//! rendering for the Sheet, Timeline and Workload tabs. Every projection is recomputed
//! from the board on each frame through the pure view functions.

use std::collections::HashSet;
use std::io;
use std::time::{Duration, Instant};

use chrono::Local;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::board::{format_date, format_days_remaining, format_mandays, render_bar, render_week_header, Board, Origin};
use crate::fields::{FilterField, GroupBy, ViewState};
use crate::group::group_tasks;
use crate::metrics::{date_range, task_position, timeline_tasks, week_ticks, workload_report, DateRange};
use crate::task::Task;
use crate::tui::{
    colors::{days_remaining_style, priority_color, status_color, workload_color, DARK_GREEN, DARK_RED, GOLD, SLATE},
    enums::{AppState, AppView, InputMode},
    input::InputField,
    run::DashboardConfig,
    utils::centered_rect,
};
use crate::view::{filter_tasks, next_filter_value, view, ViewQuery};

const TIMELINE_LABEL_WIDTH: u16 = 30;

/// One line of the timeline tab.
#[derive(Debug, Clone, PartialEq)]
enum TimelineRow<'a> {
    Group { key: String, count: usize, collapsed: bool },
    Task(&'a Task),
}

/// Timeline projection of the filtered batch.
struct TimelineModel<'a> {
    state: ViewState,
    range: DateRange,
    rows: Vec<TimelineRow<'a>>,
}

fn timeline_model<'a>(
    tasks: &'a [Task],
    query: &ViewQuery,
    by: GroupBy,
    collapsed: &HashSet<String>,
) -> TimelineModel<'a> {
    let filtered = filter_tasks(tasks, &query.filters, &query.search);
    let dated = timeline_tasks(filtered);
    let range = date_range(dated.iter().copied(), Local::now().naive_local());
    // A batch without any fully-dated task has nothing to chart, filters or not.
    let state = ViewState::from_counts(timeline_tasks(tasks).len(), dated.len());

    let mut rows = Vec::new();
    for group in group_tasks(dated, by) {
        let is_collapsed = collapsed.contains(&group.key);
        rows.push(TimelineRow::Group {
            count: group.tasks.len(),
            collapsed: is_collapsed,
            key: group.key,
        });
        if !is_collapsed {
            rows.extend(group.tasks.into_iter().map(TimelineRow::Task));
        }
    }
    TimelineModel { state, range, rows }
}

fn filter_field_for_key(c: char) -> Option<FilterField> {
    match c {
        'p' => Some(FilterField::Platform),
        'j' => Some(FilterField::Project),
        't' => Some(FilterField::Status),
        'i' => Some(FilterField::Priority),
        'd' => Some(FilterField::Dev),
        _ => None,
    }
}

fn empty_message(state: ViewState, no_data: &str, no_matches: &str) -> Option<String> {
    match state {
        ViewState::NoData => Some(no_data.to_string()),
        ViewState::NoMatches => Some(no_matches.to_string()),
        ViewState::Rows => None,
    }
}

/// Main application state for the terminal dashboard.
pub struct App {
    config: DashboardConfig,
    board: Board,
    state: AppState,
    view: AppView,
    input_mode: InputMode,
    search: InputField,
    query: ViewQuery,
    group_by: GroupBy,
    collapsed: HashSet<String>,
    sheet_state: TableState,
    timeline_state: TableState,
    workload_state: TableState,
    detail_task: Option<u64>,
    status_message: String,
    last_fetch: Instant,
}

impl App {
    /// Create the app and perform the first load.
    pub fn new(config: DashboardConfig) -> Self {
        let board = Board::load(&config.source, config.timeout);
        Self::with_board(config, board)
    }

    fn with_board(config: DashboardConfig, board: Board) -> Self {
        let mut app = App {
            config,
            board,
            state: AppState::Dashboard,
            view: AppView::Sheet,
            input_mode: InputMode::None,
            search: InputField::new(),
            query: ViewQuery::default(),
            group_by: GroupBy::default(),
            collapsed: HashSet::new(),
            sheet_state: TableState::default(),
            timeline_state: TableState::default(),
            workload_state: TableState::default(),
            detail_task: None,
            status_message: String::new(),
            last_fetch: Instant::now(),
        };
        app.clamp_selection();
        app
    }

    /// Replace the board with a fresh load of the configured source.
    fn refresh(&mut self) {
        debug!("refreshing board");
        self.board = Board::load(&self.config.source, self.config.timeout);
        self.last_fetch = Instant::now();
        if self.detail_task.is_some_and(|id| self.board.get(id).is_none()) {
            self.detail_task = None;
            self.state = AppState::Dashboard;
        }
        self.clamp_selection();
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    fn row_count(&self) -> usize {
        match self.view {
            AppView::Sheet => view(&self.board.tasks, &self.query).rows.len(),
            AppView::Timeline => timeline_model(&self.board.tasks, &self.query, self.group_by, &self.collapsed)
                .rows
                .len(),
            AppView::Workload => workload_report(&self.board.tasks, self.config.capacity).entries.len(),
        }
    }

    fn current_state_mut(&mut self) -> &mut TableState {
        match self.view {
            AppView::Sheet => &mut self.sheet_state,
            AppView::Timeline => &mut self.timeline_state,
            AppView::Workload => &mut self.workload_state,
        }
    }

    /// Keep the selection of the active tab inside its row count.
    fn clamp_selection(&mut self) {
        let len = self.row_count();
        let state = self.current_state_mut();
        match (state.selected(), len) {
            (_, 0) => state.select(None),
            (None, _) => state.select(Some(0)),
            (Some(i), n) if i >= n => state.select(Some(n - 1)),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let state = self.current_state_mut();
        let current = state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        state.select(Some(next as usize));
    }

    fn selected_task(&self) -> Option<&Task> {
        match self.view {
            AppView::Sheet => {
                let table = view(&self.board.tasks, &self.query);
                self.sheet_state.selected().and_then(|i| table.rows.get(i).copied())
            }
            AppView::Timeline => {
                let model = timeline_model(&self.board.tasks, &self.query, self.group_by, &self.collapsed);
                match self.timeline_state.selected().and_then(|i| model.rows.get(i)) {
                    Some(TimelineRow::Task(task)) => Some(*task),
                    _ => None,
                }
            }
            AppView::Workload => None,
        }
    }

    fn selected_group(&self) -> Option<String> {
        if self.view != AppView::Timeline {
            return None;
        }
        let model = timeline_model(&self.board.tasks, &self.query, self.group_by, &self.collapsed);
        match self.timeline_state.selected().and_then(|i| model.rows.get(i)) {
            Some(TimelineRow::Group { key, .. }) => Some(key.clone()),
            Some(TimelineRow::Task(task)) => Some(crate::group::group_key(task, self.group_by).to_string()),
            None => None,
        }
    }

    fn cycle_filter(&mut self, field: FilterField) {
        let next = next_filter_value(&self.board.tasks, field, self.query.filters.get(field));
        let label = next.clone().unwrap_or_else(|| field.all_label().to_string());
        self.query.filters.set(field, next);
        self.set_status_message(format!("Filter: {label}"));
        self.clamp_selection();
    }

    fn handle_search_input(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.search.clear();
                self.input_mode = InputMode::None;
            }
            KeyCode::Enter => {
                self.input_mode = InputMode::None;
            }
            KeyCode::Backspace => self.search.handle_backspace(),
            KeyCode::Delete => self.search.handle_delete(),
            KeyCode::Left => self.search.move_cursor_left(),
            KeyCode::Right => self.search.move_cursor_right(),
            KeyCode::Char(c) => self.search.handle_char(c),
            _ => {}
        }
        self.query.search = self.search.value.clone();
        self.clamp_selection();
    }

    fn handle_dashboard_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.search.value.is_empty() {
                    return true;
                }
                self.search.clear();
                self.query.search.clear();
                self.clamp_selection();
            }
            KeyCode::Tab => {
                self.view = self.view.next();
                self.clamp_selection();
            }
            KeyCode::BackTab => {
                self.view = self.view.next().next();
                self.clamp_selection();
            }
            KeyCode::Char(n @ '1'..='3') => {
                self.view = AppView::ALL[n as usize - '1' as usize];
                self.clamp_selection();
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-10),
            KeyCode::PageDown => self.move_selection(10),
            KeyCode::Home => self.move_selection(isize::MIN / 2),
            KeyCode::End => self.move_selection(isize::MAX / 2),
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Search;
            }
            KeyCode::Char('c') => {
                let msg = if self.query.filters.is_active() || !self.query.search.is_empty() {
                    "Filters cleared"
                } else {
                    "No filters active"
                };
                self.query.filters.clear();
                self.search.clear();
                self.query.search.clear();
                self.set_status_message(msg.to_string());
                self.clamp_selection();
            }
            KeyCode::Char('s') => {
                self.query.sort_by(self.query.sort_field.next());
                self.set_status_message(format!("Sort: {}", self.query.sort_field.label()));
            }
            KeyCode::Char('o') => {
                self.query.sort_order = self.query.sort_order.toggled();
            }
            KeyCode::Char('g') => {
                self.group_by = self.group_by.toggled();
                self.collapsed.clear();
                self.set_status_message(format!("Timeline grouped by {}", self.group_by.label()));
                self.clamp_selection();
            }
            KeyCode::Char(' ') => {
                if let Some(key) = self.selected_group() {
                    if !self.collapsed.remove(&key) {
                        self.collapsed.insert(key);
                    }
                    self.clamp_selection();
                }
            }
            KeyCode::Char('r') => {
                self.refresh();
                self.set_status_message(format!("Refreshed: {} tasks", self.board.tasks.len()));
            }
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.state = AppState::Help,
            KeyCode::Enter => {
                if let Some(id) = self.selected_task().map(|t| t.id) {
                    self.detail_task = Some(id);
                    self.state = AppState::TaskDetail;
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = filter_field_for_key(c) {
                    self.cycle_filter(field);
                }
            }
            _ => {}
        }
        false
    }

    /// Handle one key press. Returns true if the application should quit.
    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.clear_status_message();
        match self.state {
            AppState::Dashboard if self.input_mode == InputMode::Search => {
                self.handle_search_input(key);
                false
            }
            AppState::Dashboard => self.handle_dashboard_input(key, modifiers),
            AppState::TaskDetail | AppState::Help => {
                if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
                    return true;
                }
                self.state = AppState::Dashboard;
                self.detail_task = None;
                false
            }
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key.code, key.modifiers));
                }
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<Line> = AppView::ALL
            .iter()
            .enumerate()
            .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.title())))
            .collect();
        let source = match &self.board.origin {
            Origin::Source { description } => description.clone(),
            Origin::Demo { .. } => "DEMO DATA".to_string(),
        };
        let tabs = Tabs::new(titles)
            .select(self.view.index())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(Span::styled("TASKBOARD", Style::default().add_modifier(Modifier::BOLD)))
                    .title_bottom(Line::from(source).alignment(Alignment::Right)),
            )
            .highlight_style(Style::default().fg(Color::Black).bg(GOLD).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, area);
    }

    fn render_query_line(&self, f: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for field in FilterField::ALL {
            let value = self.query.filters.get(field).unwrap_or(field.all_label());
            let style = if self.query.filters.get(field).is_some() {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            spans.push(Span::styled(value.to_string(), style));
            spans.push(Span::raw("  "));
        }
        spans.push(Span::raw(format!(
            "Sort: {} {}",
            self.query.sort_field.label(),
            self.query.sort_order.arrow()
        )));
        if !self.query.search.is_empty() || self.input_mode == InputMode::Search {
            spans.push(Span::raw("  Search: "));
            let prefix: usize = spans.iter().map(|s| s.content.chars().count()).sum();
            if self.input_mode == InputMode::Search {
                let x = area.x + (prefix + self.search.cursor) as u16;
                f.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
            }
            spans.push(Span::styled(self.search.value.clone(), Style::default().fg(GOLD)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_empty(&self, f: &mut Frame, area: Rect, title: &str, message: String) {
        let paragraph = Paragraph::new(vec![Line::from(""), Line::from(message)])
            .block(Block::default().borders(Borders::ALL).title(title.to_string()))
            .alignment(Alignment::Center);
        f.render_widget(paragraph, area);
    }

    fn render_sheet(&mut self, f: &mut Frame, area: Rect) {
        let table_view = view(&self.board.tasks, &self.query);
        if let Some(msg) = empty_message(
            table_view.state,
            "No tasks found. Check that the sheet is published and has data.",
            "No tasks match the current filters. Press 'c' to clear them.",
        ) {
            self.render_empty(f, area, "Tasks", msg);
            return;
        }

        let today = Local::now().date_naive();
        let header = Row::new(
            [
                "#", "Platform", "Project", "Task", "Dev", "Status", "Days", "Pri", "Start", "End", "Left",
            ]
            .iter()
            .map(|h| Cell::from(*h).style(Style::default().add_modifier(Modifier::BOLD))),
        )
        .style(Style::default().bg(DARK_GREEN).fg(Color::White))
        .height(1);

        let rows: Vec<Row> = table_view
            .rows
            .iter()
            .map(|task| {
                let style = if task.is_completed() {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default().fg(Color::White)
                };
                let title = if task.blocker.is_empty() {
                    task.title.clone()
                } else {
                    format!("{} ⚠", task.title)
                };
                Row::new(vec![
                    Cell::from(task.id.to_string()),
                    Cell::from(task.platform.clone()),
                    Cell::from(task.project.clone()),
                    Cell::from(title),
                    Cell::from(task.dev.clone()),
                    Cell::from(task.status.clone()).style(Style::default().fg(status_color(&task.status))),
                    Cell::from(format_mandays(task.mandays)),
                    Cell::from(task.priority.clone()).style(Style::default().fg(priority_color(&task.priority))),
                    Cell::from(format_date(&task.start_date)),
                    Cell::from(format_date(&task.end_date)),
                    Cell::from(format_days_remaining(&task.end_date, today))
                        .style(days_remaining_style(&task.end_date, today)),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(4),
            Constraint::Length(10),
            Constraint::Length(18),
            Constraint::Min(24),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(5),
            Constraint::Length(4),
            Constraint::Length(13),
            Constraint::Length(13),
            Constraint::Length(9),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Tasks ({}/{}) - Press 'h' for help",
                table_view.rows.len(),
                table_view.total
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.sheet_state);
    }

    fn render_timeline(&mut self, f: &mut Frame, area: Rect) {
        let model = timeline_model(&self.board.tasks, &self.query, self.group_by, &self.collapsed);
        if let Some(msg) = empty_message(
            model.state,
            "No tasks found.",
            "No tasks with both a start and end date match the current filters.",
        ) {
            self.render_empty(f, area, "Timeline", msg);
            return;
        }

        // borders, highlight symbol and column spacing
        let bar_width = area.width.saturating_sub(TIMELINE_LABEL_WIDTH + 6) as usize;
        let header = Row::new(vec![
            Cell::from(format!("{} ↕ g", self.group_by.label())),
            Cell::from(render_week_header(&model.range, &week_ticks(&model.range), bar_width)),
        ])
        .style(Style::default().bg(SLATE).fg(Color::White).add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = model
            .rows
            .iter()
            .map(|row| match row {
                TimelineRow::Group { key, count, collapsed } => {
                    let marker = if *collapsed { "▶" } else { "▼" };
                    let key = if key.is_empty() { "(unassigned)" } else { key.as_str() };
                    Row::new(vec![
                        Cell::from(format!("{marker} {key} ({count})")),
                        Cell::from(""),
                    ])
                    .style(Style::default().add_modifier(Modifier::BOLD))
                }
                TimelineRow::Task(task) => {
                    let bar = task_position(task, &model.range)
                        .map(|pos| render_bar(&pos, bar_width))
                        .unwrap_or_default();
                    Row::new(vec![
                        Cell::from(format!("  {}", task.title)),
                        Cell::from(Span::styled(bar, Style::default().fg(status_color(&task.status)))),
                    ])
                }
            })
            .collect();

        let widths = [Constraint::Length(TIMELINE_LABEL_WIDTH), Constraint::Min(10)];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "Timeline {} to {} ({} days)",
                model.range.start.format("%b %-d"),
                model.range.end.format("%b %-d, %Y"),
                model.range.days()
            )))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, area, &mut self.timeline_state);
    }

    fn render_workload(&mut self, f: &mut Frame, area: Rect) {
        let report = workload_report(&self.board.tasks, self.config.capacity);
        if let Some(msg) = empty_message(report.state, "No developers assigned.", "No developers assigned.") {
            self.render_empty(f, area, "Workload", msg);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let summary = &report.summary;
        let mut summary_spans = vec![
            Span::raw(format!(
                "{} developers  {} active tasks  avg {}%  ",
                summary.developers, summary.active_tasks, summary.average_utilization
            )),
            Span::styled(format!("{} free  ", summary.free), Style::default().fg(Color::Green)),
            Span::styled(format!("{} available  ", summary.available), Style::default().fg(GOLD)),
            Span::styled(format!("{} overloaded", summary.overloaded), Style::default().fg(Color::Red)),
        ];
        if !report.idle.is_empty() {
            summary_spans.push(Span::raw(format!("  | idle: {}", report.idle.join(", "))));
        }
        let summary_block = Paragraph::new(Line::from(summary_spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Capacity {} mandays/week", format_mandays(report.capacity))),
        );
        f.render_widget(summary_block, chunks[0]);

        let bar_width = chunks[1].width.saturating_sub(70).max(10) as usize;
        let rows: Vec<Row> = report
            .entries
            .iter()
            .map(|w| {
                let filled = (w.utilization_percent.clamp(0, 100) as usize * bar_width + 50) / 100;
                let color = workload_color(w.status);
                Row::new(vec![
                    Cell::from(w.emoji),
                    Cell::from(w.dev.clone()),
                    Cell::from(Line::from(vec![
                        Span::styled("█".repeat(filled), Style::default().fg(color)),
                        Span::styled("░".repeat(bar_width - filled), Style::default().fg(Color::DarkGray)),
                    ])),
                    Cell::from(format!("{}%", w.utilization_percent)),
                    Cell::from(format!(
                        "{}/{}",
                        format_mandays(w.total_mandays),
                        format_mandays(report.capacity)
                    )),
                    Cell::from(w.tasks.len().to_string()),
                    Cell::from(w.status.description()).style(Style::default().fg(color)),
                ])
            })
            .collect();

        let header = Row::new(["", "Developer", "Utilization", "%", "Mandays", "Tasks", "Status"])
            .style(Style::default().bg(DARK_RED).fg(Color::White).add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Length(2),
            Constraint::Length(14),
            Constraint::Length(bar_width as u16),
            Constraint::Length(5),
            Constraint::Length(9),
            Constraint::Length(5),
            Constraint::Min(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("Workload"))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");

        f.render_stateful_widget(table, chunks[1], &mut self.workload_state);
    }

    /// Render the detail popup for the chosen task.
    fn render_task_detail(&self, f: &mut Frame, area: Rect) {
        let Some(task) = self.detail_task.and_then(|id| self.board.get(id)) else {
            return;
        };
        let today = Local::now().date_naive();
        let label = |name: &str| Span::styled(format!("{name:<15}"), Style::default().add_modifier(Modifier::BOLD));
        let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
        let field = |name: &str, value: String| Line::from(vec![label(name), Span::raw(value)]);

        let text = vec![
            Line::from(Span::styled(
                task.title.clone(),
                Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            field("Platform", or_dash(&task.platform)),
            field("Project", or_dash(&task.project)),
            field("Developer", or_dash(&task.dev)),
            Line::from(vec![
                label("Status"),
                Span::styled(task.status.clone(), Style::default().fg(status_color(&task.status))),
            ]),
            Line::from(vec![
                label("Priority"),
                Span::styled(task.priority.clone(), Style::default().fg(priority_color(&task.priority))),
            ]),
            field("Mandays", format_mandays(task.mandays)),
            field("Start", or_dash(&format_date(&task.start_date))),
            field("End", or_dash(&format_date(&task.end_date))),
            Line::from(vec![
                label("Days remaining"),
                Span::styled(
                    format_days_remaining(&task.end_date, today),
                    days_remaining_style(&task.end_date, today),
                ),
            ]),
            field("Go-live", or_dash(&format_date(&task.go_live_date))),
            Line::from(""),
            field("Blocker", or_dash(&task.blocker)),
            field("Impact", or_dash(&task.impact)),
        ];

        let area = centered_rect(60, 60, area);
        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("Task #{} - any key to close", task.id)),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let section = |title: &str| {
            Line::from(vec![Span::styled(
                title.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )])
        };
        let help_text = vec![
            section("Taskboard Help"),
            Line::from(""),
            section("Navigation:"),
            Line::from("  Tab/1/2/3    Switch between Sheet, Timeline and Workload"),
            Line::from("  Up/Down      Move selection (PgUp/PgDn/Home/End)"),
            Line::from("  Enter        Show task details"),
            Line::from("  r            Reload the sheet now"),
            Line::from("  h/?/F1       Show this help"),
            Line::from("  q/Esc        Quit"),
            Line::from(""),
            section("Filtering and sorting:"),
            Line::from("  /            Search title, project, developer and blocker"),
            Line::from("  p j t i d    Cycle platform, project, status, priority, developer filter"),
            Line::from("  c            Clear all filters and search"),
            Line::from("  s            Cycle sort column"),
            Line::from("  o            Toggle ascending/descending"),
            Line::from(""),
            section("Timeline:"),
            Line::from("  g            Group by developer or project"),
            Line::from("  Space        Expand or collapse the selected group"),
        ];

        let area = centered_rect(70, 70, area);
        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    /// Render the status bar at the bottom of the screen.
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let (text, bg) = if !self.status_message.is_empty() {
            (self.status_message.clone(), SLATE)
        } else if self.input_mode == InputMode::Search {
            ("Search: type to filter (Esc to clear, Enter to confirm)".to_string(), SLATE)
        } else {
            let updated = self.board.last_updated(Local::now());
            match &self.board.origin {
                Origin::Demo { reason } => (
                    format!("Demo data ({reason}) | Updated {updated} | Press 'h' for help"),
                    DARK_RED,
                ),
                Origin::Source { .. } => (
                    format!(
                        "{} tasks | Updated {updated} | Auto-refresh {}s | Press 'h' for help",
                        self.board.tasks.len(),
                        self.config.refresh.as_secs()
                    ),
                    DARK_GREEN,
                ),
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(bg).fg(Color::White))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the active tab and overlays.
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_query_line(f, chunks[1]);
        match self.view {
            AppView::Sheet => self.render_sheet(f, chunks[2]),
            AppView::Timeline => self.render_timeline(f, chunks[2]),
            AppView::Workload => self.render_workload(f, chunks[2]),
        }
        match self.state {
            AppState::TaskDetail => self.render_task_detail(f, chunks[2]),
            AppState::Help => self.render_help(f, chunks[2]),
            AppState::Dashboard => {}
        }
        self.render_status_bar(f, chunks[3]);
    }

    /// Main event loop for the dashboard.
    ///
    /// Handles rendering, input and the periodic refetch until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
            if self.last_fetch.elapsed() >= self.config.refresh {
                self.refresh();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{SortField, SortOrder};
    use crate::source::Source;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let config = DashboardConfig {
            source: Source::Unconfigured,
            timeout: Duration::from_secs(1),
            refresh: Duration::from_secs(30),
            capacity: 40.0,
        };
        let board = Board::from_csv(
            "Platform,Project,Task,Dev,Status,Mandays,Priority,Start Date,End Date\n\
             Web,Portal,Login page,Alice,In Progress,5,P0,2025-12-01,2025-12-05\n\
             App,Mobile,Push alerts,Bob,Backlog,3,P1,2025-12-03,2025-12-10\n\
             Web,Portal,Search,Alice,Completed,2,P2,2025-11-20,2025-11-25\n\
             API,Core,Rate limits,Cara,Blocked,4,P1,,\n",
            "test.csv",
        );
        App::with_board(config, board)
    }

    fn press(app: &mut App, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_filter_keys_cycle_through_values() {
        let mut app = app();
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.query.filters.platform.as_deref(), Some("API"));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.query.filters.platform.as_deref(), Some("App"));
        press(&mut app, KeyCode::Char('p'));
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.query.filters.platform, None);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.query.filters.dev.as_deref(), Some("Alice"));
        assert_eq!(app.row_count(), 2);
        press(&mut app, KeyCode::Char('c'));
        assert!(!app.query.filters.is_active());
    }

    #[test]
    fn test_search_mode_edits_query() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.input_mode, InputMode::Search);
        type_text(&mut app, "login");
        // filter keys are plain text while searching
        assert_eq!(app.query.filters.platform, None);
        assert_eq!(app.query.search, "login");
        assert_eq!(app.row_count(), 1);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::None);
        assert_eq!(app.selected_task().map(|t| t.id), Some(1));
    }

    #[test]
    fn test_sort_keys() {
        let mut app = app();
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.query.sort_field, SortField::EndDate);
        let before = app.query.sort_order;
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.query.sort_order, before.toggled());
        // a new column starts ascending
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.query.sort_field, SortField::Platform);
        assert_eq!(app.query.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_default_sort_selects_earliest_start() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::TaskDetail);
        // the undated task sorts first
        assert_eq!(app.detail_task, Some(4));
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.state, AppState::Dashboard);
    }

    #[test]
    fn test_timeline_groups_collapse() {
        let mut app = app();
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, AppView::Timeline);
        // Alice (2 tasks) and Bob (1 task), Cara has no dates
        assert_eq!(app.row_count(), 5);
        assert_eq!(app.selected_group().as_deref(), Some("Alice"));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.row_count(), 3);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.row_count(), 5);

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.group_by, GroupBy::Project);
        assert_eq!(app.selected_group().as_deref(), Some("Mobile"));
    }

    #[test]
    fn test_timeline_without_dated_tasks_is_no_data() {
        let tasks = Board::from_csv("Task,Dev\nFix bug,Alice\nShip,Bob\n", "test.csv").tasks;
        let model = timeline_model(&tasks, &ViewQuery::default(), GroupBy::Dev, &HashSet::new());
        assert_eq!(model.state, ViewState::NoData);
        assert!(model.rows.is_empty());

        let app = app();
        let mut query = ViewQuery::default();
        query.filters.dev = Some("Cara".into());
        let model = timeline_model(&app.board.tasks, &query, GroupBy::Dev, &HashSet::new());
        assert_eq!(model.state, ViewState::NoMatches);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!press(&mut app, KeyCode::Char('h')));
        assert_eq!(app.state, AppState::Help);
        assert!(!press(&mut app, KeyCode::Esc));
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_refresh_replaces_board() {
        let mut app = app();
        press(&mut app, KeyCode::Char('r'));
        assert!(app.board.is_demo());
        assert_eq!(app.board.tasks.len(), 5);
    }

    #[test]
    fn test_renders_every_tab() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(160, 40)).unwrap();
        for _ in 0..3 {
            terminal.draw(|f| app.render(f)).unwrap();
            press(&mut app, KeyCode::Tab);
        }
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('/'));
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
