//! Application module
//!
//! - Actions: what can happen
//! - State: what is true right now
//! - Reducer: pure `(State, Action) -> State`
//! - Keymap: which key means which action

pub mod actions;
pub mod event;
pub mod keymap;
pub mod reducer;
pub mod state;

pub use actions::Action;
pub use reducer::reduce;
pub use state::{AppState, EditorStats, ResultsState, StatusBarState, UiConfig};
