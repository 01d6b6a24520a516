//! sprint-tui - Terminal UI for Code Sprint
//!
//! Edit the `calculate_path` solution with bracket/quote pairing, submit it
//! for timing, and watch the team's best time.

use anyhow::Context;
use libsprint::config::resolve_data_path;
use libsprint::logging::config_from_env;
use libsprint::service::submission::ResetConfirmation;
use sprint_tui::{
    app::{event::EventHandler, event::TuiEvent, keymap::action_for_key, reduce, Action, AppState},
    editor::EditorPane,
    services::ServiceHandle,
    terminal::{install_panic_hook, TerminalGuard, Tui},
    ui,
};

fn main() -> anyhow::Result<()> {
    init_logging();

    // Load everything before touching the terminal so errors print normally
    let services = ServiceHandle::new().context("failed to start Code Sprint services")?;

    install_panic_hook();
    let mut terminal = TerminalGuard::enter().context("failed to set up terminal")?;

    run_app(&mut terminal, &services)?;
    Ok(())
}

fn init_logging() {
    let path = match resolve_data_path() {
        Ok(dir) => dir.join("sprint-tui.log"),
        Err(_) => return,
    };
    if let Err(e) = config_from_env(false).init_to_file(&path) {
        eprintln!("Warning: could not open log file {}: {}", path.display(), e);
    }
}

fn run_app(terminal: &mut Tui, services: &ServiceHandle) -> anyhow::Result<()> {
    let mut state = AppState::new();
    state = reduce(state, Action::TeamLoaded(services.team()?));

    let mut editor = EditorPane::new(&services.code(), &services.template());
    state = reduce(state, Action::EditorChanged(editor.stats()));

    let events = services.subscribe();
    services.initialize();

    let event_handler = EventHandler::new(state.config.tick_rate_ms);

    loop {
        editor.restyle(&state);
        terminal.draw(|frame| ui::render(frame, &state, editor.widget()))?;

        let action = match event_handler.next()? {
            TuiEvent::Key(key) => match action_for_key(&state, key) {
                Some(action) => action,
                // Overlays swallow editor input
                None if state.help_visible || state.error.is_some() => Action::Tick,
                None => match editor.handle_key(key, services.controller()) {
                    Ok(true) => Action::EditorChanged(editor.stats()),
                    Ok(false) => Action::Tick,
                    Err(e) => Action::ShowError(format!("Could not save code: {}", e.display_message())),
                },
            },
            other => other.into(),
        };

        let could_submit = state.can_submit();
        let refreshing = state.results.refreshing;
        state = reduce(state, action.clone());

        // Side effects
        match action {
            Action::SubmitRequested if could_submit => services.submit(),
            Action::RefreshRequested if !refreshing => services.refresh_best_time(),
            // Picks up `sprint-team register|join` run while the TUI is open
            Action::Tick => match services.team() {
                Ok(team) if team != state.team => state = reduce(state, Action::TeamLoaded(team)),
                Ok(_) => {}
                Err(e) => tracing::warn!("Could not read team identity: {}", e),
            },
            Action::ResetConfirmed => {
                let mut confirmation: ResetConfirmation = state.reset;
                match services.reset(&mut confirmation) {
                    Ok(()) => {
                        editor.load(&services.code(), 0);
                        state = reduce(state, Action::EditorChanged(editor.stats()));
                    }
                    Err(e) => {
                        state = reduce(state, Action::ShowError(e.display_message()));
                    }
                }
            }
            _ => {}
        }

        // Service notifications
        let mut notified = false;
        while let Ok(event) = events.try_recv() {
            state = reduce(state, Action::Notify(event));
            notified = true;
        }
        if notified {
            state = reduce(state, Action::ControllerSynced(services.snapshot()));
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}
