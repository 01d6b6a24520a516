//! Core types for Code Sprint

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SprintError};
use crate::store::{KeyValueStore, TEAM_ID_KEY, TEAM_NAME_KEY};

/// Team identity established by the register/join flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub team_name: String,
    pub team_id: String,
}

impl TeamIdentity {
    pub fn new(team_name: impl Into<String>, team_id: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            team_id: team_id.into(),
        }
    }

    /// Read the identity persisted by a previous register/join
    ///
    /// Returns `None` when no team ID is stored (or it is empty).
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load(store: &dyn KeyValueStore) -> Result<Option<Self>> {
        let team_id = match store.get(TEAM_ID_KEY)? {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Ok(None),
        };
        let team_name = store.get(TEAM_NAME_KEY)?.unwrap_or_default();
        Ok(Some(Self { team_name, team_id }))
    }

    /// Persist both keys
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.set(TEAM_ID_KEY, &self.team_id)?;
        store.set(TEAM_NAME_KEY, &self.team_name)
    }
}

/// Fastest recorded run for a team, authoritative on the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "seconds", rename_all = "snake_case")]
pub enum BestTime {
    #[default]
    Unset,
    Seconds(f64),
}

impl BestTime {
    /// Build from the backend's `fastest_time` field
    ///
    /// `null`, negative and non-finite values all mean no accepted submission yet.
    pub fn from_wire(value: Option<f64>) -> Self {
        match value {
            Some(seconds) if seconds.is_finite() && seconds >= 0.0 => BestTime::Seconds(seconds),
            _ => BestTime::Unset,
        }
    }

    pub fn seconds(&self) -> Option<f64> {
        match self {
            BestTime::Seconds(seconds) => Some(*seconds),
            BestTime::Unset => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, BestTime::Seconds(_))
    }
}

impl std::fmt::Display for BestTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BestTime::Seconds(seconds) => write!(f, "{} seconds", seconds),
            BestTime::Unset => write!(f, "no accepted submission yet"),
        }
    }
}

/// Image rendered by the evaluation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "base64", rename_all = "snake_case")]
pub enum RenderedImage {
    /// Base64-encoded raster data
    Produced(String),
    /// The backend sent the empty-string sentinel (or no image field at all)
    NotProduced,
}

impl RenderedImage {
    pub fn from_wire(value: Option<String>) -> Self {
        match value {
            Some(data) if !data.trim().is_empty() => RenderedImage::Produced(data),
            _ => RenderedImage::NotProduced,
        }
    }

    pub fn is_produced(&self) -> bool {
        matches!(self, RenderedImage::Produced(_))
    }

    /// Decode the base64 payload into raw image bytes
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when no image was produced or the payload is not
    /// valid base64.
    pub fn decode(&self) -> Result<Vec<u8>> {
        match self {
            RenderedImage::Produced(data) => {
                let compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
                base64::engine::general_purpose::STANDARD
                    .decode(compact.as_bytes())
                    .map_err(|e| SprintError::InvalidInput(format!("Image payload is not valid base64: {}", e)))
            }
            RenderedImage::NotProduced => Err(SprintError::InvalidInput(
                "No image generated!".to_string(),
            )),
        }
    }
}

/// Outcome of an accepted evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Wall-clock run time reported by the backend, in seconds
    pub elapsed_seconds: f64,
    pub image: RenderedImage,
    pub output: Option<String>,
    pub submission_id: Option<i64>,
}

impl SubmissionResult {
    pub fn no_image_produced(&self) -> bool {
        !self.image.is_produced()
    }
}

/// Lifecycle of the most recent submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SubmissionState {
    /// Nothing submitted yet in this session
    #[default]
    Idle,
    Submitting,
    Succeeded(SubmissionResult),
    Failed(String),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    /// The submit trigger is available whenever nothing is in flight
    pub fn can_submit(&self) -> bool {
        !self.is_submitting()
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        match self {
            SubmissionState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            SubmissionState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
