//! Actions for the reducer pattern
//!
//! All state transitions are triggered by actions. Side effects (network
//! calls, store writes) are performed by the event loop after reducing.

use crossterm::event::KeyEvent;
use libsprint::service::events::Event;
use libsprint::service::submission::ControllerSnapshot;
use libsprint::TeamIdentity;

use super::state::EditorStats;

#[derive(Debug, Clone)]
pub enum Action {
    // === UI Events ===
    /// Keyboard input not consumed by the editor
    Key(KeyEvent),

    /// Periodic tick, also used when an event produced nothing to do
    Tick,

    Resize(u16, u16),

    // === Navigation ===
    Quit,
    ToggleHelp,
    HideHelp,

    // === Editor ===
    /// The code text changed (typing, pairing or reset)
    EditorChanged(EditorStats),

    // === Submission ===
    /// Ctrl+S; the event loop asks the controller to submit
    SubmitRequested,

    /// Ctrl+B; the event loop asks the controller for the best time
    RefreshRequested,

    // === Reset ===
    /// First Ctrl+R press
    ResetArmed,

    /// Second Ctrl+R press; the event loop performs the reset
    ResetConfirmed,

    ResetDisarmed,

    // === Service ===
    /// Notification from the service event bus
    Notify(Event),

    /// Fresh copy of the controller state
    ControllerSynced(ControllerSnapshot),

    TeamLoaded(Option<TeamIdentity>),

    // === Error Handling ===
    ShowError(String),
    DismissError,

    // === Status Bar ===
    SetStatus(String),
    ClearStatus,
}
