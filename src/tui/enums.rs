//! Enumerations for TUI state management.

/// Dashboard tab.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppView {
    Sheet,
    Timeline,
    Workload,
}

impl AppView {
    pub const ALL: [AppView; 3] = [AppView::Sheet, AppView::Timeline, AppView::Workload];

    pub fn title(self) -> &'static str {
        match self {
            AppView::Sheet => "Sheet",
            AppView::Timeline => "Timeline",
            AppView::Workload => "Workload",
        }
    }

    pub fn next(self) -> AppView {
        match self {
            AppView::Sheet => AppView::Timeline,
            AppView::Timeline => AppView::Workload,
            AppView::Workload => AppView::Sheet,
        }
    }

    pub fn index(self) -> usize {
        match self {
            AppView::Sheet => 0,
            AppView::Timeline => 1,
            AppView::Workload => 2,
        }
    }
}

/// Overlay drawn on top of the active tab.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    Dashboard,
    TaskDetail,
    Help,
}

/// Input mode for text entry fields.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputMode {
    None,
    Search,
}
