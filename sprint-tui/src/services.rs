//! Service layer adapter for the TUI
//!
//! The event loop is synchronous; the submission controller is async.
//! `ServiceHandle` owns a tokio runtime, spawns controller calls on it, and
//! forwards the service event bus to a crossbeam channel that the loop drains
//! without blocking.
//!
//! ```no_run
//! use sprint_tui::services::ServiceHandle;
//!
//! # fn example() -> sprint_tui::error::Result<()> {
//! let services = ServiceHandle::new()?;
//! let events = services.subscribe();
//!
//! services.submit();
//!
//! // In the event loop
//! while let Ok(event) = events.try_recv() {
//!     println!("{}", event.summary());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver};
use libsprint::service::events::Event;
use libsprint::service::submission::{ControllerSnapshot, ResetConfirmation, SubmissionController};
use libsprint::{SprintService, TeamIdentity};
use tokio::sync::broadcast::error::RecvError;

use crate::error::{Result, TuiError};

pub struct ServiceHandle {
    service: Arc<SprintService>,
    runtime: tokio::runtime::Runtime,
}

impl ServiceHandle {
    /// Load configuration, open the session store and start the runtime
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be initialized or the runtime
    /// cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_service(SprintService::new()?)
    }

    /// Wrap an already assembled service (tests use a mock backend)
    ///
    /// # Errors
    ///
    /// Returns an error if the tokio runtime cannot be created.
    pub fn with_service(service: SprintService) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| TuiError::Application(format!("failed to start async runtime: {}", e)))?;

        Ok(Self {
            service: Arc::new(service),
            runtime,
        })
    }

    /// Forward all service events to a crossbeam channel
    pub fn subscribe(&self) -> Receiver<Event> {
        let (tx, rx) = unbounded();
        let mut event_rx = self.service.subscribe();

        self.runtime.spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            // Receiver dropped, stop forwarding
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Event receiver lagged, skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        rx
    }

    pub fn controller(&self) -> &Arc<SubmissionController> {
        self.service.controller()
    }

    /// Stored team identity, if the user has registered or joined
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn team(&self) -> Result<Option<TeamIdentity>> {
        Ok(self.service.team().current()?)
    }

    /// Team ID for controller calls; empty when none is stored, which the
    /// controller reports as a missing identity.
    fn team_id(&self) -> String {
        match self.service.team().current() {
            Ok(Some(identity)) => identity.team_id,
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!("Could not read team identity: {}", e);
                String::new()
            }
        }
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.controller().snapshot()
    }

    pub fn code(&self) -> String {
        self.controller().code()
    }

    pub fn template(&self) -> String {
        self.controller().template()
    }

    /// Initial best-time refresh, in the background
    pub fn initialize(&self) {
        let controller = Arc::clone(self.controller());
        let team_id = self.team_id();
        self.runtime.spawn(async move {
            controller.initialize(&team_id).await;
        });
    }

    /// Submit the current buffer in the background
    ///
    /// The outcome arrives as events; a second call while one is in flight is
    /// turned away by the controller.
    pub fn submit(&self) {
        let controller = Arc::clone(self.controller());
        let team_id = self.team_id();
        self.runtime.spawn(async move {
            match controller.submit_current(&team_id).await {
                Ok(outcome) => tracing::debug!("Submission finished: {:?}", outcome),
                Err(e) => tracing::debug!("Submission not sent: {}", e),
            }
        });
    }

    /// Refresh the best time in the background
    pub fn refresh_best_time(&self) {
        let controller = Arc::clone(self.controller());
        let team_id = self.team_id();
        self.runtime.spawn(async move {
            if let Err(e) = controller.refresh_best_time(&team_id).await {
                tracing::debug!("Best-time refresh failed: {}", e);
            }
        });
    }

    /// Reset the code buffer to the template
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn reset(&self, confirmation: &mut ResetConfirmation) -> Result<()> {
        Ok(self.controller().reset_to_template(confirmation)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsprint::backend::mock::MockBackend;
    use libsprint::{Config, FileStore, KeyValueStore, MemoryStore};
    use std::time::Duration;

    fn handle(backend: MockBackend, team: Option<TeamIdentity>) -> ServiceHandle {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        if let Some(team) = team {
            team.save(store.as_ref()).unwrap();
        }
        let service = SprintService::from_parts(Config::default(), store, Arc::new(backend)).unwrap();
        ServiceHandle::with_service(service).unwrap()
    }

    #[test]
    fn test_submit_events_reach_sync_channel() {
        let backend = MockBackend::success(1.5, "", "done");
        let services = handle(backend.clone(), Some(TeamIdentity::new("A", "1")));
        let events = services.subscribe();

        services.submit();

        let first = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, Event::SubmissionStarted { .. }));
        let second = events.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(second, Event::SubmissionSucceeded { .. }));
    }

    #[test]
    fn test_submit_without_team_reports_error() {
        let backend = MockBackend::default();
        let services = handle(backend.clone(), None);
        let events = services.subscribe();

        services.submit();

        match events.recv_timeout(Duration::from_secs(5)).unwrap() {
            Event::Error { message } => assert!(message.contains("Team ID not found")),
            other => panic!("Expected error event, got {:?}", other),
        }
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_team_registered_elsewhere_is_seen() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("session.json");
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
        let service = SprintService::from_parts(Config::default(), store, Arc::new(MockBackend::default())).unwrap();
        let services = ServiceHandle::with_service(service).unwrap();
        assert_eq!(services.team().unwrap(), None);

        // `sprint-team register` in another process
        TeamIdentity::new("Speedsters", "42")
            .save(&FileStore::open(&path).unwrap())
            .unwrap();

        assert_eq!(services.team().unwrap(), Some(TeamIdentity::new("Speedsters", "42")));
        assert_eq!(services.team_id(), "42");

        // An edit in the TUI keeps the identity on disk
        services.controller().set_code("edited").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(TeamIdentity::load(&reopened).unwrap(), Some(TeamIdentity::new("Speedsters", "42")));
    }

    #[test]
    fn test_reset_restores_template() {
        let services = handle(MockBackend::default(), None);
        services.controller().set_code("scratch").unwrap();

        let mut confirmation = ResetConfirmation::default();
        confirmation.arm();
        services.reset(&mut confirmation).unwrap();

        assert_eq!(services.code(), services.template());
        assert!(!confirmation.is_armed());
    }
}
