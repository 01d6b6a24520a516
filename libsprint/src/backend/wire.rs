//! JSON bodies exchanged with the evaluation backend

use serde::{Deserialize, Deserializer, Serialize};

/// `status` field carried by every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
    #[serde(other)]
    Unknown,
}

impl ResponseStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseStatus::Success)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest<'a> {
    #[serde(rename = "teamID")]
    pub team_id: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamNameRequest<'a> {
    #[serde(rename = "teamName")]
    pub team_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub time_to_run: Option<f64>,
    /// Base64 raster data, or `""` when the run produced no image
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub submission_id: Option<i64>,
}

impl SubmitResponse {
    pub fn success(time_to_run: f64, image: &str, output: &str) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: None,
            time_to_run: Some(time_to_run),
            image: Some(image.to_string()),
            output: Some(output.to_string()),
            submission_id: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.to_string()),
            time_to_run: None,
            image: None,
            output: None,
            submission_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastestTimeResponse {
    pub status: ResponseStatus,
    /// `null` until the team has an accepted submission
    #[serde(default)]
    pub fastest_time: Option<f64>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl FastestTimeResponse {
    pub fn success(fastest_time: Option<f64>) -> Self {
        Self {
            status: ResponseStatus::Success,
            fastest_time,
            team_name: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamResponse {
    pub status: ResponseStatus,
    /// Integer on the wire, opaque string in the client
    #[serde(default, deserialize_with = "deserialize_opaque_id")]
    pub team_id: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub team_name: String,
    pub fastest_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub leaderboard: Vec<LeaderboardEntry>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a non-2xx response
///
/// Application errors carry `message`; framework errors carry `detail`, which
/// is either a string or a list of validation problems.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        if let Some(message) = self.message.filter(|m| !m.is_empty()) {
            return Some(message);
        }
        match self.detail? {
            serde_json::Value::String(detail) => Some(detail),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}
