//! Pure reducer function for state transitions
//!
//! `(State, Action) -> State`, with no I/O. Requests that need the network or
//! the store (submit, refresh, reset) only update what the user sees here; the
//! event loop performs them after reducing.

use chrono::Local;
use libsprint::service::events::Event;
use libsprint::service::submission::{ControllerSnapshot, ResetConfirmation};
use libsprint::SubmissionState;

use super::actions::Action;
use super::keymap::action_for_key;
use super::state::{AppState, ResultsState, StatusBarState};

const REFRESHING: &str = "Refreshing best time...";

pub fn reduce(state: AppState, action: Action) -> AppState {
    match action {
        // === UI Events ===
        Action::Key(key) => match action_for_key(&state, key) {
            Some(action) => reduce(state, action),
            None => state,
        },
        Action::Tick => state,
        Action::Resize(_, _) => state,

        // === Navigation ===
        Action::Quit => AppState {
            should_quit: true,
            ..state
        },

        Action::ToggleHelp => AppState {
            help_visible: !state.help_visible,
            ..state
        },

        Action::HideHelp => AppState {
            help_visible: false,
            ..state
        },

        // === Editor ===
        Action::EditorChanged(editor) => AppState { editor, ..state },

        // === Submission ===
        Action::SubmitRequested => {
            if !state.can_submit() {
                return with_status(state, "A submission is already running", false);
            }
            let state = AppState {
                results: ResultsState {
                    submission: SubmissionState::Submitting,
                    error: None,
                    ..state.results
                },
                ..state
            };
            with_status(state, "Processing...", false)
        }

        Action::RefreshRequested => {
            if state.results.refreshing {
                return state;
            }
            with_status(state, REFRESHING, false)
        }

        // === Reset ===
        Action::ResetArmed => {
            let mut reset = state.reset;
            reset.arm();
            with_status(
                AppState { reset, ..state },
                "Press Ctrl+R again to reset your code to the template (Esc to cancel)",
                false,
            )
        }

        // The reset itself happens in the event loop; the CodeReset
        // notification disarms the gesture.
        Action::ResetConfirmed => state,

        Action::ResetDisarmed => AppState {
            reset: ResetConfirmation::default(),
            status: StatusBarState::default(),
            ..state
        },

        // === Service ===
        Action::Notify(event) => apply_event(state, event),

        Action::ControllerSynced(snapshot) => AppState {
            results: results_from(snapshot),
            ..state
        },

        Action::TeamLoaded(team) => AppState { team, ..state },

        // === Error Handling ===
        Action::ShowError(error) => AppState {
            error: Some(error),
            ..state
        },

        Action::DismissError => AppState { error: None, ..state },

        // === Status Bar ===
        Action::SetStatus(message) => with_status(state, &message, false),

        Action::ClearStatus => AppState {
            status: StatusBarState::default(),
            ..state
        },
    }
}

fn with_status(state: AppState, message: &str, is_error: bool) -> AppState {
    AppState {
        status: StatusBarState {
            message: Some(message.to_string()),
            is_error,
        },
        ..state
    }
}

fn apply_event(state: AppState, event: Event) -> AppState {
    let message = event.summary();
    let is_error = event.is_error();

    let state = match event {
        Event::CodeReset => AppState {
            reset: ResetConfirmation::default(),
            ..state
        },
        Event::SubmissionStarted { .. } => AppState {
            results: ResultsState {
                submission: SubmissionState::Submitting,
                error: None,
                ..state.results
            },
            ..state
        },
        // Only an explicit refresh reports the best time in the status bar;
        // after a run the run summary stays visible.
        Event::BestTimeUpdated { .. } if state.status.message.as_deref() != Some(REFRESHING) => {
            return state;
        }
        _ => state,
    };

    with_status(state, &message, is_error)
}

fn results_from(snapshot: ControllerSnapshot) -> ResultsState {
    ResultsState {
        submission: snapshot.state,
        best_time: snapshot.best_time,
        error: snapshot.error,
        last_completed: snapshot
            .last_completed_at
            .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string()),
        refreshing: snapshot.refreshing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsprint::{BestTime, RenderedImage, SubmissionResult};

    #[test]
    fn test_reducer_is_pure() {
        let state = AppState::new();
        let state_clone = state.clone();

        let new_state = reduce(state_clone.clone(), Action::SetStatus("Test".to_string()));

        assert!(state_clone.status.message.is_none());
        assert_eq!(new_state.status.message, Some("Test".to_string()));
    }

    #[test]
    fn test_quit_action() {
        let state = AppState::new();
        assert!(!state.should_quit);

        let new_state = reduce(state, Action::Quit);
        assert!(new_state.should_quit);
    }

    #[test]
    fn test_submit_request_marks_submitting_and_clears_error() {
        let mut state = AppState::new();
        state.results.error = Some("old".to_string());

        let state = reduce(state, Action::SubmitRequested);
        assert!(state.is_submitting());
        assert_eq!(state.results.error, None);
        assert_eq!(state.status.message.as_deref(), Some("Processing..."));
    }

    #[test]
    fn test_submit_request_ignored_while_submitting() {
        let mut state = AppState::new();
        state.results.submission = SubmissionState::Submitting;

        let state = reduce(state, Action::SubmitRequested);
        assert!(state.is_submitting());
        assert_eq!(state.status.message.as_deref(), Some("A submission is already running"));
    }

    #[test]
    fn test_controller_sync_replaces_results() {
        let state = AppState::new();
        let snapshot = ControllerSnapshot {
            state: SubmissionState::Succeeded(SubmissionResult {
                elapsed_seconds: 4.2,
                image: RenderedImage::NotProduced,
                output: Some("ok".to_string()),
                submission_id: None,
            }),
            best_time: BestTime::Seconds(3.9),
            error: None,
            last_completed_at: Some(chrono::Utc::now()),
            refreshing: false,
        };

        let state = reduce(state, Action::ControllerSynced(snapshot));
        assert!(state.can_submit());
        assert_eq!(state.results.best_time, BestTime::Seconds(3.9));
        assert!(state.results.last_completed.is_some());
    }

    #[test]
    fn test_code_reset_event_disarms() {
        let state = reduce(AppState::new(), Action::ResetArmed);
        assert!(state.reset.is_armed());

        let state = reduce(state, Action::Notify(Event::CodeReset));
        assert!(!state.reset.is_armed());
        assert_eq!(state.status.message.as_deref(), Some("Code reset successfully!"));
    }

    #[test]
    fn test_best_time_reported_only_after_explicit_refresh() {
        let event = Event::BestTimeUpdated {
            team_id: "7".to_string(),
            best_time: Some(2.0),
        };

        let state = reduce(AppState::new(), Action::SetStatus("Code ran in 4.2 seconds".to_string()));
        let state = reduce(state, Action::Notify(event.clone()));
        assert_eq!(state.status.message.as_deref(), Some("Code ran in 4.2 seconds"));

        let state = reduce(state, Action::RefreshRequested);
        let state = reduce(state, Action::Notify(event));
        assert_eq!(state.status.message.as_deref(), Some("Best time: 2 seconds"));
    }

    #[test]
    fn test_error_events_flag_status() {
        let state = reduce(
            AppState::new(),
            Action::Notify(Event::Error {
                message: "Team ID not found! Register or join a team first".to_string(),
            }),
        );
        assert!(state.status.is_error);
    }
}
