//! Mock backend for testing
//!
//! A configurable stand-in for the evaluation backend. It can answer with
//! canned successes, explicit rejections or transport failures, add latency,
//! and records every call so tests can assert on what reached the network.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use super::{
    BackendClient, BackendResult, FastestTimeResponse, LeaderboardEntry, LeaderboardResponse,
    ResponseStatus, SubmitResponse, TeamResponse,
};
use crate::error::BackendError;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Submit { team_id: String, code: String },
    FastestTime { team_id: String },
    Register { team_name: String },
    Join { team_name: String },
    Leaderboard,
}

/// Configuration for mock backend behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub submit: BackendResult<SubmitResponse>,
    pub fastest_time: BackendResult<FastestTimeResponse>,
    pub register: BackendResult<TeamResponse>,
    pub join: BackendResult<TeamResponse>,
    pub leaderboard: BackendResult<LeaderboardResponse>,

    /// Delay before `submit` answers (simulates a long evaluation run)
    pub submit_delay: Duration,

    /// Delay before `fastest_time` answers
    pub fastest_time_delay: Duration,

    /// Every call, in the order it was made
    pub calls: Arc<Mutex<Vec<MockCall>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            submit: Ok(SubmitResponse::success(1.0, "", "")),
            fastest_time: Ok(FastestTimeResponse::success(None)),
            register: Ok(team_response("1", "mock-team")),
            join: Ok(team_response("1", "mock-team")),
            leaderboard: Ok(LeaderboardResponse {
                status: ResponseStatus::Success,
                leaderboard: Vec::new(),
                message: None,
            }),
            submit_delay: Duration::from_millis(0),
            fastest_time_delay: Duration::from_millis(0),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn team_response(team_id: &str, team_name: &str) -> TeamResponse {
    TeamResponse {
        status: ResponseStatus::Success,
        team_id: Some(team_id.to_string()),
        team_name: Some(team_name.to_string()),
        message: None,
    }
}

/// Mock backend for testing
///
/// Clones share the call log, so a test can keep one handle and give another
/// to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    config: MockConfig,
}

impl MockBackend {
    /// Create a new mock backend with the given configuration
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Backend whose evaluation succeeds
    pub fn success(time_to_run: f64, image: &str, output: &str) -> Self {
        Self::new(MockConfig {
            submit: Ok(SubmitResponse::success(time_to_run, image, output)),
            ..Default::default()
        })
    }

    /// Backend that answers `{status: "error", message}` with a 2xx
    pub fn error_payload(message: &str) -> Self {
        Self::new(MockConfig {
            submit: Ok(SubmitResponse::error(message)),
            ..Default::default()
        })
    }

    /// Backend that answers every submission with a non-2xx rejection
    pub fn rejected(message: &str) -> Self {
        Self::new(MockConfig {
            submit: Err(BackendError::Rejected(message.to_string())),
            ..Default::default()
        })
    }

    /// Backend that cannot be reached at all
    pub fn unreachable() -> Self {
        let failure = || BackendError::Transport("connection refused".to_string());
        Self::new(MockConfig {
            submit: Err(failure()),
            fastest_time: Err(failure()),
            register: Err(failure()),
            join: Err(failure()),
            leaderboard: Err(failure()),
            ..Default::default()
        })
    }

    pub fn with_best_time(mut self, fastest_time: Option<f64>) -> Self {
        self.config.fastest_time = Ok(FastestTimeResponse::success(fastest_time));
        self
    }

    pub fn with_fastest_time_result(mut self, result: BackendResult<FastestTimeResponse>) -> Self {
        self.config.fastest_time = result;
        self
    }

    pub fn with_register_result(mut self, result: BackendResult<TeamResponse>) -> Self {
        self.config.register = result;
        self
    }

    pub fn with_join_result(mut self, result: BackendResult<TeamResponse>) -> Self {
        self.config.join = result;
        self
    }

    pub fn with_team(mut self, team_id: &str, team_name: &str) -> Self {
        self.config.register = Ok(team_response(team_id, team_name));
        self.config.join = Ok(team_response(team_id, team_name));
        self
    }

    pub fn with_leaderboard(mut self, entries: Vec<(&str, f64)>) -> Self {
        self.config.leaderboard = Ok(LeaderboardResponse {
            status: ResponseStatus::Success,
            leaderboard: entries
                .into_iter()
                .map(|(team_name, fastest_time)| LeaderboardEntry {
                    team_name: team_name.to_string(),
                    fastest_time,
                })
                .collect(),
            message: None,
        });
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.config.submit_delay = delay;
        self
    }

    pub fn with_fastest_time_delay(mut self, delay: Duration) -> Self {
        self.config.fastest_time_delay = delay;
        self
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.config.calls.lock().unwrap().clone()
    }

    /// Number of times submit was called
    pub fn submit_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MockCall::Submit { .. }))
            .count()
    }

    /// Number of times the fastest time was requested
    pub fn fastest_time_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, MockCall::FastestTime { .. }))
            .count()
    }

    fn record(&self, call: MockCall) {
        self.config.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn submit(&self, team_id: &str, code: &str) -> BackendResult<SubmitResponse> {
        self.record(MockCall::Submit {
            team_id: team_id.to_string(),
            code: code.to_string(),
        });

        if !self.config.submit_delay.is_zero() {
            sleep(self.config.submit_delay).await;
        }

        self.config.submit.clone()
    }

    async fn fastest_time(&self, team_id: &str) -> BackendResult<FastestTimeResponse> {
        self.record(MockCall::FastestTime {
            team_id: team_id.to_string(),
        });

        if !self.config.fastest_time_delay.is_zero() {
            sleep(self.config.fastest_time_delay).await;
        }

        self.config.fastest_time.clone()
    }

    async fn register(&self, team_name: &str) -> BackendResult<TeamResponse> {
        self.record(MockCall::Register {
            team_name: team_name.to_string(),
        });
        self.config.register.clone()
    }

    async fn join(&self, team_name: &str) -> BackendResult<TeamResponse> {
        self.record(MockCall::Join {
            team_name: team_name.to_string(),
        });
        self.config.join.clone()
    }

    async fn leaderboard(&self) -> BackendResult<LeaderboardResponse> {
        self.record(MockCall::Leaderboard);
        self.config.leaderboard.clone()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_success_records_submission() {
        let backend = MockBackend::success(4.2, "", "ok");

        let response = backend.submit("T1", "code").await.unwrap();
        assert!(response.status.is_success());
        assert_eq!(response.time_to_run, Some(4.2));

        assert_eq!(backend.submit_call_count(), 1);
        assert_eq!(
            backend.calls(),
            vec![MockCall::Submit {
                team_id: "T1".to_string(),
                code: "code".to_string()
            }]
        );
    }

    #[tokio::test]
    async fn test_mock_clones_share_call_log() {
        let backend = MockBackend::default();
        let handle = backend.clone();

        backend.fastest_time("T1").await.unwrap();
        assert_eq!(handle.fastest_time_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_unreachable() {
        let backend = MockBackend::unreachable();
        assert!(matches!(backend.submit("T1", "x").await, Err(BackendError::Transport(_))));
        assert!(matches!(backend.leaderboard().await, Err(BackendError::Transport(_))));
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let backend = MockBackend::default().with_submit_delay(Duration::from_millis(50));

        let start = std::time::Instant::now();
        backend.submit("T1", "x").await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_mock_leaderboard() {
        let backend = MockBackend::default().with_leaderboard(vec![("A", 1.5), ("B", 2.5)]);
        let response = backend.leaderboard().await.unwrap();
        assert_eq!(response.leaderboard.len(), 2);
        assert_eq!(response.leaderboard[1].fastest_time, 2.5);
    }
}
