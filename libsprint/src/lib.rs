//! Code Sprint - client core for the timed coding challenge
//!
//! This library holds everything the command-line tools and the terminal UI
//! share: bracket/quote pairing for the editor, the write-through code buffer,
//! the submission controller and the backend client.

pub mod backend;
pub mod buffer;
pub mod config;
pub mod error;
pub mod logging;
pub mod pairing;
pub mod service;
pub mod store;
pub mod template;
pub mod types;

// Re-export commonly used types
pub use buffer::{CodeBuffer, SessionContext};
pub use config::Config;
pub use error::{BackendError, Result, SprintError};
pub use pairing::{insert_pair, CursorPosition, PairEdit};
pub use service::submission::{ResetConfirmation, SubmissionController, SubmitOutcome};
pub use service::SprintService;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{BestTime, RenderedImage, SubmissionResult, SubmissionState, TeamIdentity};
