use crate::catalog::params::ParamUpdate;
use crate::catalog::reconciler::{CaptureOutcome, FetchOutcome};

/// Events flowing through the Elm-architecture event loop.
#[derive(Debug)]
pub enum AppEvent {
    /// Periodic tick for debounce timers, notification TTLs, etc.
    Tick,
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// A page fetch (single or catch-up) finished.
    PageLoaded(FetchOutcome),
    /// A capture or release call finished.
    CaptureDone(CaptureOutcome),
    /// Category list for the type selector.
    CategoriesLoaded(Vec<String>),
    /// A resolved action to execute.
    Action(Action),
    /// Notification to display to the user.
    Notification(Notification),
    /// Request to quit the application.
    Quit,
}

/// High-level actions dispatched by the input mapper and the views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    ShowHelp,
    CloseHelp,
    CycleTheme,

    // Focus
    FocusList,
    FocusSearch,
    FocusFilters,
    FocusNext,
    FocusPrev,

    // Query
    UpdateQuery(ParamUpdate),
    BackToFirstPage,

    // Items
    ToggleCapture { id: u64, captured: bool },
    OpenDetail(u64),
    CloseDetail,
}

/// Which area has input focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Focus {
    List,
    Search,
    Filters,
}

impl Focus {
    pub const ALL: [Focus; 3] = [Focus::List, Focus::Search, Focus::Filters];

    pub fn label(self) -> &'static str {
        match self {
            Focus::List => "List",
            Focus::Search => "Search",
            Focus::Filters => "Filters",
        }
    }

    pub fn next(self) -> Focus {
        let idx = Focus::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Focus::ALL[(idx + 1) % Focus::ALL.len()]
    }

    pub fn prev(self) -> Focus {
        let idx = Focus::ALL.iter().position(|&f| f == self).unwrap_or(0);
        Focus::ALL[(idx + Focus::ALL.len() - 1) % Focus::ALL.len()]
    }
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_cycles() {
        let mut f = Focus::List;
        for _ in 0..Focus::ALL.len() {
            f = f.next();
        }
        assert_eq!(f, Focus::List);
        assert_eq!(Focus::List.prev(), Focus::Filters);
        assert_eq!(Focus::List.next(), Focus::Search);
    }
}
