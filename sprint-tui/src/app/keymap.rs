//! Keybindings
//!
//! | Key      | Action                                  |
//! |----------|-----------------------------------------|
//! | Ctrl+S   | submit (ignored while a run is pending) |
//! | Ctrl+R   | reset code, press twice to confirm      |
//! | Ctrl+B   | refresh best time                       |
//! | F1       | toggle help                             |
//! | Esc      | close help, disarm reset, dismiss error |
//! | Ctrl+Q   | quit (not while submitting)             |
//! | Ctrl+C   | quit                                    |
//!
//! Keys without a binding go to the editor.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::actions::Action;
use super::state::AppState;

/// Action bound to `key` in `state`, or `None` if the editor should get it
pub fn action_for_key(state: &AppState, key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => Some(Action::Quit),
        KeyCode::Char('q') if ctrl => {
            if state.is_submitting() {
                Some(Action::SetStatus(
                    "A submission is still running (Ctrl+C to force quit)".to_string(),
                ))
            } else {
                Some(Action::Quit)
            }
        }
        KeyCode::F(1) => Some(Action::ToggleHelp),
        KeyCode::Char('s') if ctrl => Some(Action::SubmitRequested),
        KeyCode::Char('b') if ctrl => Some(Action::RefreshRequested),
        KeyCode::Char('r') if ctrl => {
            if state.reset.is_armed() {
                Some(Action::ResetConfirmed)
            } else {
                Some(Action::ResetArmed)
            }
        }
        KeyCode::Esc => {
            if state.help_visible {
                Some(Action::HideHelp)
            } else if state.reset.is_armed() {
                Some(Action::ResetDisarmed)
            } else if state.error.is_some() {
                Some(Action::DismissError)
            } else {
                Some(Action::ClearStatus)
            }
        }
        _ => None,
    }
}
