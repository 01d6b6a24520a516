//! Error types for sprint-tui

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Service error: {0}")]
    Service(#[from] libsprint::SprintError),

    #[error("Terminal error: {0}")]
    Terminal(#[from] std::io::Error),

    /// Startup failures outside the service layer (runtime, log file)
    #[error("Application error: {0}")]
    Application(String),
}

impl TuiError {
    /// Text for the error overlay
    pub fn display_message(&self) -> String {
        match self {
            TuiError::Service(e) => e.display_message(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TuiError>;
