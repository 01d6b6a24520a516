//! Team identity service
//!
//! Registers or joins a team on the backend and remembers the resulting
//! identity in the session store, where the submission flow picks it up.

use std::sync::Arc;

use tracing::info;

use super::events::{Event, EventBus};
use crate::backend::{BackendClient, BackendResult, LeaderboardEntry, TeamResponse};
use crate::error::{BackendError, Result, SprintError, GENERIC_TRANSPORT_MESSAGE};
use crate::store::{KeyValueStore, TEAM_ID_KEY, TEAM_NAME_KEY};
use crate::types::TeamIdentity;

#[derive(Clone)]
pub struct TeamService {
    backend: Arc<dyn BackendClient>,
    store: Arc<dyn KeyValueStore>,
    event_bus: EventBus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Registered,
    Joined,
}

impl TeamService {
    pub fn new(backend: Arc<dyn BackendClient>, store: Arc<dyn KeyValueStore>, event_bus: EventBus) -> Self {
        Self {
            backend,
            store,
            event_bus,
        }
    }

    /// Identity stored by a previous register/join, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn current(&self) -> Result<Option<TeamIdentity>> {
        TeamIdentity::load(self.store.as_ref())
    }

    /// Stored team ID, or `MissingTeamIdentity`
    ///
    /// # Errors
    ///
    /// Returns `MissingTeamIdentity` when no team is stored.
    pub fn require_team_id(&self) -> Result<String> {
        self.current()?
            .map(|identity| identity.team_id)
            .ok_or(SprintError::MissingTeamIdentity)
    }

    /// Create a new team and remember it
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty name, or the backend error (for
    /// example when the name is taken).
    pub async fn register(&self, team_name: &str) -> Result<TeamIdentity> {
        let team_name = validate_name(team_name)?;
        let response = self.backend.register(team_name).await;
        self.adopt(team_name, response, Membership::Registered)
    }

    /// Join an existing team and remember it
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty name, or the backend error (for
    /// example when the team does not exist).
    pub async fn join(&self, team_name: &str) -> Result<TeamIdentity> {
        let team_name = validate_name(team_name)?;
        let response = self.backend.join(team_name).await;
        self.adopt(team_name, response, Membership::Joined)
    }

    /// Drop the stored identity
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn forget(&self) -> Result<()> {
        self.store.remove(TEAM_ID_KEY)?;
        self.store.remove(TEAM_NAME_KEY)?;
        info!("Forgot stored team identity");
        Ok(())
    }

    /// Standings, fastest team first
    ///
    /// # Errors
    ///
    /// Returns the backend error, or `Rejected` when the backend reports an
    /// error status.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let response = self.backend.leaderboard().await.map_err(|e| self.report(e))?;
        if !response.status.is_success() {
            return Err(self.report(BackendError::Rejected(message_or_generic(response.message))));
        }

        let mut entries = response.leaderboard;
        entries.sort_by(|a, b| a.fastest_time.total_cmp(&b.fastest_time));
        Ok(entries)
    }

    fn adopt(
        &self,
        requested_name: &str,
        response: BackendResult<TeamResponse>,
        membership: Membership,
    ) -> Result<TeamIdentity> {
        let body = response.map_err(|e| self.report(e))?;

        let team_id = match body.team_id {
            Some(id) if body.status.is_success() && !id.is_empty() => id,
            _ => return Err(self.report(BackendError::Rejected(message_or_generic(body.message)))),
        };
        let team_name = body
            .team_name
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| requested_name.to_string());

        let identity = TeamIdentity::new(team_name, team_id);
        identity.save(self.store.as_ref())?;
        info!(team_id = %identity.team_id, "Stored identity for team '{}'", identity.team_name);

        let event = match membership {
            Membership::Registered => Event::TeamRegistered {
                team_name: identity.team_name.clone(),
                team_id: identity.team_id.clone(),
            },
            Membership::Joined => Event::TeamJoined {
                team_name: identity.team_name.clone(),
                team_id: identity.team_id.clone(),
            },
        };
        self.event_bus.emit(event);

        Ok(identity)
    }

    fn report(&self, error: BackendError) -> SprintError {
        self.event_bus.emit(Event::Error {
            message: error.display_message(),
        });
        SprintError::Backend(error)
    }
}

fn validate_name(team_name: &str) -> Result<&str> {
    let trimmed = team_name.trim();
    if trimmed.is_empty() {
        return Err(SprintError::InvalidInput("Team name cannot be empty".to_string()));
    }
    Ok(trimmed)
}

fn message_or_generic(message: Option<String>) -> String {
    message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| GENERIC_TRANSPORT_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockCall};
    use crate::backend::ResponseStatus;
    use crate::store::MemoryStore;

    fn service(backend: MockBackend) -> (TeamService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = TeamService::new(Arc::new(backend), store.clone(), EventBus::new(16));
        (service, store)
    }

    #[tokio::test]
    async fn test_register_persists_identity() {
        let (service, store) = service(MockBackend::default().with_team("42", "Speedsters"));

        let identity = service.register("Speedsters").await.unwrap();
        assert_eq!(identity, TeamIdentity::new("Speedsters", "42"));
        assert_eq!(store.get(TEAM_ID_KEY).unwrap().as_deref(), Some("42"));
        assert_eq!(store.get(TEAM_NAME_KEY).unwrap().as_deref(), Some("Speedsters"));
        assert_eq!(service.require_team_id().unwrap(), "42");
    }

    #[tokio::test]
    async fn test_join_without_name_in_response_uses_requested_name() {
        let backend = MockBackend::default().with_join_result(Ok(TeamResponse {
            status: ResponseStatus::Success,
            team_id: Some("7".to_string()),
            team_name: None,
            message: Some("You have joined the team successfully!".to_string()),
        }));
        let (service, _) = service(backend);

        let identity = service.join("  Night Owls ").await.unwrap();
        assert_eq!(identity, TeamIdentity::new("Night Owls", "7"));
    }

    #[tokio::test]
    async fn test_empty_name_rejected_locally() {
        let backend = MockBackend::default();
        let (service, _) = service(backend.clone());

        let err = service.register("   ").await.unwrap_err();
        assert!(matches!(err, SprintError::InvalidInput(_)));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_team_is_rejected() {
        let backend = MockBackend::default()
            .with_join_result(Err(BackendError::Rejected("Team does not exist!".to_string())));
        let (service, store) = service(backend.clone());

        let err = service.join("Nobody").await.unwrap_err();
        assert_eq!(err.display_message(), "Team does not exist!");
        assert_eq!(store.get(TEAM_ID_KEY).unwrap(), None);
        assert_eq!(
            backend.calls(),
            vec![MockCall::Join {
                team_name: "Nobody".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_forget_clears_identity() {
        let (service, _) = service(MockBackend::default().with_team("1", "A"));
        service.register("A").await.unwrap();

        service.forget().unwrap();
        assert_eq!(service.current().unwrap(), None);
        assert!(matches!(service.require_team_id(), Err(SprintError::MissingTeamIdentity)));
    }

    #[tokio::test]
    async fn test_leaderboard_sorted_fastest_first() {
        let backend = MockBackend::default().with_leaderboard(vec![("Slow", 9.0), ("Fast", 1.0), ("Mid", 4.0)]);
        let (service, _) = service(backend);

        let entries = service.leaderboard().await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.team_name.as_str()).collect();
        assert_eq!(names, vec!["Fast", "Mid", "Slow"]);
    }
}
