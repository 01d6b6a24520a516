//! Error types for Code Sprint

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SprintError>;

/// Message shown when the backend could not be reached or answered with
/// something that is not a usable response.
pub const GENERIC_TRANSPORT_MESSAGE: &str = "An unexpected error occurred";

#[derive(Error, Debug)]
pub enum SprintError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Team ID not found! Register or join a team first")]
    MissingTeamIdentity,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SprintError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SprintError::InvalidInput(_) | SprintError::MissingTeamIdentity => 3,
            SprintError::Backend(BackendError::Rejected(_)) => 2,
            SprintError::Backend(_) => 1,
            SprintError::Config(_) => 1,
            SprintError::Store(_) => 1,
        }
    }

    /// Text suitable for the error field of a result view.
    ///
    /// Backend rejections are surfaced verbatim, transport failures collapse
    /// to a generic message.
    pub fn display_message(&self) -> String {
        match self {
            SprintError::Backend(backend) => backend.display_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store file: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The request never produced a usable response (connection, TLS, JSON decoding).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The backend answered with an explicit error payload.
    #[error("Rejected by backend: {0}")]
    Rejected(String),
}

impl BackendError {
    pub fn display_message(&self) -> String {
        match self {
            BackendError::Transport(_) => GENERIC_TRANSPORT_MESSAGE.to_string(),
            BackendError::Rejected(message) => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = SprintError::InvalidInput("Empty team name".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_missing_team_identity() {
        assert_eq!(SprintError::MissingTeamIdentity.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_backend_errors() {
        let rejected = SprintError::Backend(BackendError::Rejected("Team does not exist!".to_string()));
        assert_eq!(rejected.exit_code(), 2);

        let transport = SprintError::Backend(BackendError::Transport("connection refused".to_string()));
        assert_eq!(transport.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_config_and_store() {
        let config = SprintError::Config(ConfigError::MissingField("backend.base_url".to_string()));
        assert_eq!(config.exit_code(), 1);

        let store = SprintError::Store(StoreError::Poisoned);
        assert_eq!(store.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting() {
        let error = SprintError::Backend(BackendError::Rejected("SyntaxError: line 3".to_string()));
        assert_eq!(
            format!("{}", error),
            "Backend error: Rejected by backend: SyntaxError: line 3"
        );

        let error = SprintError::Config(ConfigError::MissingField("backend.api_key".to_string()));
        assert_eq!(
            format!("{}", error),
            "Configuration error: Missing required field: backend.api_key"
        );
    }

    #[test]
    fn test_display_message_rejected_is_verbatim() {
        let error = SprintError::Backend(BackendError::Rejected("Team does not exist!".to_string()));
        assert_eq!(error.display_message(), "Team does not exist!");
    }

    #[test]
    fn test_display_message_transport_is_generic() {
        let error = SprintError::Backend(BackendError::Transport(
            "error sending request for url (http://localhost:8000/submit)".to_string(),
        ));
        assert_eq!(error.display_message(), GENERIC_TRANSPORT_MESSAGE);
    }

    #[test]
    fn test_display_message_missing_team() {
        let message = SprintError::MissingTeamIdentity.display_message();
        assert!(message.contains("Team ID not found"));
    }

    #[test]
    fn test_error_conversion_from_store_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let error: SprintError = StoreError::Io(io).into();
        match error {
            SprintError::Store(StoreError::Io(_)) => {}
            _ => panic!("Expected SprintError::Store"),
        }
    }

    #[test]
    fn test_backend_error_clone() {
        let original = BackendError::Transport("timeout".to_string());
        let cloned = original.clone();
        assert_eq!(original, cloned);
    }
}
