//! Dashboard entry point and terminal setup.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::source::Source;
use crate::tui::app::App;

/// Everything the dashboard needs to (re)load its board.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub source: Source,
    pub timeout: Duration,
    pub refresh: Duration,
    pub capacity: f64,
}

/// Initialise and run the terminal dashboard until the user quits.
pub fn run_tui(config: DashboardConfig) -> io::Result<()> {
    // Load before entering the alternate screen so a slow fetch leaves the shell usable.
    let mut app = App::new(config);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}
