//! HTTP implementation of the backend contract

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::wire::{ErrorBody, SubmitRequest, TeamNameRequest};
use super::{
    BackendClient, BackendResult, FastestTimeResponse, LeaderboardResponse, SubmitResponse,
    TeamResponse,
};
use crate::config::Config;
use crate::error::{BackendError, Result};

const API_KEY_HEADER: &str = "X-API-Key";
const USER_AGENT: &str = concat!("codesprint/", env!("CARGO_PKG_VERSION"));

/// Backend reached over HTTP with a fixed API key
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpBackend {
    /// Create a client for `base_url`
    ///
    /// The client is built without a request timeout; evaluation runs take as
    /// long as they take.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: &str, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key),
        })
    }

    /// Create a client from the `[backend]` section of the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty or the client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.backend.api_key.is_empty() {
            warn!("No API key configured; the backend will likely reject requests");
        }
        Self::new(&config.base_url()?, config.backend.api_key.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join `segments` onto the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> BackendResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BackendError::Transport(format!("invalid backend URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| BackendError::Transport(format!("backend URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn post_json<B, T>(&self, segments: &[&str], body: &B) -> BackendResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        read_json(response).await
    }

    async fn get_json<T>(&self, segments: &[&str]) -> BackendResult<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        read_json(response).await
    }
}

/// Decode a response, mapping non-2xx bodies to a readable error
async fn read_json<T: DeserializeOwned>(response: Response) -> BackendResult<T> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| BackendError::Transport(e.to_string()))?;
    decode_body(status.as_u16(), status.is_success(), &body)
}

fn decode_body<T: DeserializeOwned>(status: u16, success: bool, body: &str) -> BackendResult<T> {
    if success {
        return serde_json::from_str(body)
            .map_err(|e| BackendError::Transport(format!("invalid JSON from backend: {}", e)));
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(ErrorBody::into_message);
    match message {
        Some(message) => {
            debug!("Backend answered HTTP {}: {}", status, message);
            Err(BackendError::Rejected(message))
        }
        None => Err(BackendError::Transport(format!("HTTP {} without error message", status))),
    }
}

#[async_trait]
impl BackendClient for HttpBackend {
    async fn submit(&self, team_id: &str, code: &str) -> BackendResult<SubmitResponse> {
        self.post_json(&["submit"], &SubmitRequest { team_id, code }).await
    }

    async fn fastest_time(&self, team_id: &str) -> BackendResult<FastestTimeResponse> {
        self.get_json(&["leaderboard", team_id]).await
    }

    async fn register(&self, team_name: &str) -> BackendResult<TeamResponse> {
        self.post_json(&["register"], &TeamNameRequest { team_name }).await
    }

    async fn join(&self, team_name: &str) -> BackendResult<TeamResponse> {
        self.post_json(&["join"], &TeamNameRequest { team_name }).await
    }

    async fn leaderboard(&self) -> BackendResult<LeaderboardResponse> {
        self.get_json(&["leaderboard"]).await
    }

    fn name(&self) -> &str {
        "http"
    }
}
