//! Service layer for Code Sprint
//!
//! Business logic shared by the command-line tools and the terminal UI.
//!
//! # Architecture
//!
//! `SprintService` is the facade. It owns the shared resources (config, session
//! store, backend client, event bus) and hands out the sub-services:
//!
//! - `SubmissionController`: submit code, track the run, refresh best time
//! - `TeamService`: register/join a team, leaderboard
//! - `EventBus`: notifications for whichever front end is attached
//!
//! # Example
//!
//! ```no_run
//! use libsprint::service::SprintService;
//!
//! # async fn example() -> libsprint::Result<()> {
//! let service = SprintService::new()?;
//! let team_id = service.team().require_team_id()?;
//!
//! let outcome = service.controller().submit_current(&team_id).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod submission;
pub mod team;

use std::sync::Arc;

use tracing::debug;

use self::events::{EventBus, EventReceiver};
use self::submission::SubmissionController;
use self::team::TeamService;
use crate::backend::http::HttpBackend;
use crate::backend::BackendClient;
use crate::buffer::{CodeBuffer, SessionContext};
use crate::config::Config;
use crate::error::Result;
use crate::store::{FileStore, KeyValueStore};
use crate::types::TeamIdentity;

/// Main service facade
pub struct SprintService {
    config: Arc<Config>,
    store: Arc<dyn KeyValueStore>,
    controller: Arc<SubmissionController>,
    team: TeamService,
    event_bus: EventBus,
}

impl SprintService {
    /// Create a service from the default configuration file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or the session
    /// store cannot be opened.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::from_config(config)
    }

    /// Create a service talking HTTP to the configured backend
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be opened or the HTTP
    /// client cannot be built.
    pub fn from_config(config: Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(config.store_path())?);
        let backend: Arc<dyn BackendClient> = Arc::new(HttpBackend::from_config(&config)?);
        Self::from_parts(config, store, backend)
    }

    /// Assemble a service from explicit parts (used by tests)
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn from_parts(
        config: Config,
        store: Arc<dyn KeyValueStore>,
        backend: Arc<dyn BackendClient>,
    ) -> Result<Self> {
        let event_bus = EventBus::new(100);
        let identity = TeamIdentity::load(store.as_ref())?;
        let context = SessionContext::new(
            identity.map(|identity| identity.team_id),
            config.storage.scope_code_per_team,
        );
        let buffer = CodeBuffer::initialize(Arc::clone(&store), &context)?;
        debug!(
            backend = backend.name(),
            store = store.backend_name(),
            "Session code key is '{}'",
            buffer.key()
        );

        let controller = Arc::new(SubmissionController::new(
            Arc::clone(&backend),
            buffer,
            event_bus.clone(),
        ));
        let team = TeamService::new(backend, Arc::clone(&store), event_bus.clone());

        Ok(Self {
            config: Arc::new(config),
            store,
            controller,
            team,
            event_bus,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session store (code text and team identity)
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// The submission controller, shareable across threads
    pub fn controller(&self) -> &Arc<SubmissionController> {
        &self.controller
    }

    pub fn team(&self) -> &TeamService {
        &self.team
    }

    /// Subscribe to service events
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
