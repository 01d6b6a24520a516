//! Backend client abstraction
//!
//! The evaluation backend is consumed purely as a request/response contract:
//!
//! - `POST submit {teamID, code}` → run time, optional image, optional output
//! - `GET leaderboard/{teamID}` → the team's fastest time
//! - `POST register {teamName}` / `POST join {teamName}` → team identity
//! - `GET leaderboard` → standings
//!
//! Every request carries the `X-API-Key` header. `HttpBackend` talks to the
//! real service; `MockBackend` is a configurable stand-in for tests.
//!
//! # Examples
//!
//! ```no_run
//! use libsprint::backend::{BackendClient, http::HttpBackend};
//!
//! # async fn example() -> libsprint::Result<()> {
//! let backend = HttpBackend::new("http://localhost:8000", "workshop-key".to_string())?;
//!
//! let response = backend.submit("7", "def calculate_path(self):\n    return []").await?;
//! if response.status.is_success() {
//!     println!("Ran in {:?} seconds", response.time_to_run);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;

use crate::error::BackendError;

pub mod http;
pub mod wire;

// Mock backend is available for all builds (not just tests) to support integration tests
pub mod mock;

pub use wire::{
    FastestTimeResponse, LeaderboardEntry, LeaderboardResponse, ResponseStatus, SubmitResponse,
    TeamResponse,
};

/// Result of a single backend call
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Request/response contract of the evaluation backend
///
/// A `2xx` response whose `status` is `"error"` is returned as `Ok`; callers
/// decide what an application-level error means for them. Non-`2xx` responses
/// with a readable message become `BackendError::Rejected`, everything else
/// `BackendError::Transport`.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Submit code for evaluation
    ///
    /// There is no timeout: the call runs until the backend answers.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the backend rejects it.
    async fn submit(&self, team_id: &str, code: &str) -> BackendResult<SubmitResponse>;

    /// Fetch the fastest recorded time for a team
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or the team is unknown.
    async fn fastest_time(&self, team_id: &str) -> BackendResult<FastestTimeResponse>;

    /// Create a team
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` when the name is already taken.
    async fn register(&self, team_name: &str) -> BackendResult<TeamResponse>;

    /// Join an existing team by name
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Rejected` when the team does not exist.
    async fn join(&self, team_name: &str) -> BackendResult<TeamResponse>;

    /// Fetch the standings, fastest team first
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the request fails or there are no submissions.
    async fn leaderboard(&self) -> BackendResult<LeaderboardResponse>;

    /// Short identifier for logs (e.g. "http", "mock")
    fn name(&self) -> &str;
}
