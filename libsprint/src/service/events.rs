//! Notification channel
//!
//! Services report what happened (submission finished, best time changed, an
//! error occurred, the code was reset) on an in-process event bus. How those
//! notifications are shown is up to the front end: the TUI puts them in its
//! status bar, the CLI prints them to stderr.
//!
//! The bus uses `tokio::sync::broadcast`. If no subscribers exist, events are
//! dropped; lagging subscribers never block emitters.
//!
//! ```no_run
//! use libsprint::service::events::{EventBus, Event};
//!
//! # async fn example() {
//! let event_bus = EventBus::new(100);
//! let mut receiver = event_bus.subscribe();
//!
//! event_bus.emit(Event::CodeReset);
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("{}", event.summary());
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<Event>;

/// Event bus for distributing notifications
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with the given per-subscriber buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to all events emitted from now on
    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers (non-blocking)
    pub fn emit(&self, event: Event) {
        // send() only fails when nobody is listening
        let _ = self.sender.send(event);
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Events emitted by services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A submission request is in flight
    SubmissionStarted {
        attempt_id: String,
        team_id: String,
    },

    /// The backend accepted and ran the submission
    SubmissionSucceeded {
        attempt_id: String,
        elapsed_seconds: f64,
        image_produced: bool,
    },

    /// The run finished but produced no image
    NoImageProduced { attempt_id: String },

    /// The backend rejected the submission or could not be reached
    SubmissionFailed { attempt_id: String, message: String },

    /// A best-time refresh completed
    BestTimeUpdated {
        team_id: String,
        best_time: Option<f64>,
    },

    /// Any other error surfaced to the user
    Error { message: String },

    /// The code buffer was reset to the template
    CodeReset,

    TeamRegistered { team_name: String, team_id: String },

    TeamJoined { team_name: String, team_id: String },
}

impl Event {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Event::SubmissionFailed { .. } | Event::NoImageProduced { .. } | Event::Error { .. }
        )
    }

    /// One-line human readable text for a toast or status bar
    pub fn summary(&self) -> String {
        match self {
            Event::SubmissionStarted { .. } => "Processing...".to_string(),
            Event::SubmissionSucceeded { elapsed_seconds, .. } => {
                format!("Code ran in {} seconds", elapsed_seconds)
            }
            Event::NoImageProduced { .. } => "No image generated!".to_string(),
            Event::SubmissionFailed { message, .. } => format!("Error: {}", message),
            Event::BestTimeUpdated { best_time: Some(best), .. } => format!("Best time: {} seconds", best),
            Event::BestTimeUpdated { best_time: None, .. } => "No submissions yet for this team.".to_string(),
            Event::Error { message } => message.clone(),
            Event::CodeReset => "Code reset successfully!".to_string(),
            Event::TeamRegistered { team_name, .. } => format!("Team '{}' created successfully", team_name),
            Event::TeamJoined { team_name, .. } => format!("You have joined team '{}' successfully", team_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let event_bus = EventBus::new(10);
        let mut receiver = event_bus.subscribe();

        event_bus.emit(Event::SubmissionStarted {
            attempt_id: "a1".to_string(),
            team_id: "T1".to_string(),
        });

        match receiver.recv().await.unwrap() {
            Event::SubmissionStarted { attempt_id, team_id } => {
                assert_eq!(attempt_id, "a1");
                assert_eq!(team_id, "T1");
            }
            other => panic!("Wrong event type received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let event_bus = EventBus::new(10);
        let mut receiver1 = event_bus.subscribe();
        let mut receiver2 = event_bus.subscribe();

        event_bus.emit(Event::CodeReset);

        assert_eq!(receiver1.recv().await.unwrap(), Event::CodeReset);
        assert_eq!(receiver2.recv().await.unwrap(), Event::CodeReset);
    }

    #[test]
    fn test_no_subscribers() {
        let event_bus = EventBus::new(10);

        // Emit event with no subscribers - should not panic or block
        event_bus.emit(Event::CodeReset);
        assert_eq!(event_bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::SubmissionFailed {
            attempt_id: "a2".to_string(),
            message: "SyntaxError: line 3".to_string(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("submission_failed"));
        assert!(json.contains("SyntaxError: line 3"));

        let deserialized: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }

    #[test]
    fn test_error_classification() {
        assert!(Event::Error { message: "x".to_string() }.is_error());
        assert!(Event::NoImageProduced { attempt_id: "a".to_string() }.is_error());
        assert!(!Event::CodeReset.is_error());
        assert!(!Event::BestTimeUpdated {
            team_id: "T1".to_string(),
            best_time: Some(1.0)
        }
        .is_error());
    }

    #[test]
    fn test_summaries() {
        assert_eq!(Event::CodeReset.summary(), "Code reset successfully!");
        assert_eq!(
            Event::BestTimeUpdated {
                team_id: "T1".to_string(),
                best_time: Some(3.5)
            }
            .summary(),
            "Best time: 3.5 seconds"
        );
        assert_eq!(
            Event::NoImageProduced { attempt_id: "a".to_string() }.summary(),
            "No image generated!"
        );
    }
}
