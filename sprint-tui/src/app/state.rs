//! Application state
//!
//! All state transitions happen through the reducer (see `reducer.rs`).

use libsprint::service::submission::ResetConfirmation;
use libsprint::{BestTime, SubmissionState, TeamIdentity};

/// Root application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub should_quit: bool,

    /// Help overlay visible?
    pub help_visible: bool,

    pub team: Option<TeamIdentity>,

    pub editor: EditorStats,

    /// Mirror of the submission controller
    pub results: ResultsState,

    /// Two-step reset gesture
    pub reset: ResetConfirmation,

    pub status: StatusBarState,

    /// Error overlay
    pub error: Option<String>,

    pub config: UiConfig,
}

/// Size of the code text, for the editor title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorStats {
    pub chars: usize,
    pub lines: usize,
    /// Still identical to the starting template
    pub is_template: bool,
}

impl EditorStats {
    pub fn of(text: &str, template: &str) -> Self {
        Self {
            chars: text.chars().count(),
            lines: text.split('\n').count(),
            is_template: text == template,
        }
    }
}

/// What the results pane shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultsState {
    pub submission: SubmissionState,
    pub best_time: BestTime,
    /// Error field of the result view (submission or refresh failure)
    pub error: Option<String>,
    /// Local time of the last completed run, already formatted
    pub last_completed: Option<String>,
    pub refreshing: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusBarState {
    pub message: Option<String>,
    pub is_error: bool,
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors_enabled: bool,

    /// Tick rate in milliseconds
    pub tick_rate_ms: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        let colors_enabled = std::env::var("NO_COLOR").is_err() && std::env::var("SPRINT_TUI_NO_COLOR").is_err();

        let tick_rate_ms = std::env::var("SPRINT_TUI_TICK_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            colors_enabled,
            tick_rate_ms,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The submit trigger is enabled whenever nothing is in flight
    pub fn can_submit(&self) -> bool {
        self.results.submission.can_submit()
    }

    pub fn is_submitting(&self) -> bool {
        self.results.submission.is_submitting()
    }

    pub fn team_id(&self) -> Option<&str> {
        self.team.as_ref().map(|team| team.team_id.as_str())
    }
}
