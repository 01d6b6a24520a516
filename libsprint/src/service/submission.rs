//! Submission controller
//!
//! Drives the `Idle → Submitting → Succeeded | Failed` cycle for one team and
//! keeps the team's best time fresh. At most one submission and at most one
//! best-time refresh are in flight at any time.
//!
//! The controller is shared by reference (`&self` methods) and keeps its state
//! behind a `std::sync::Mutex` that is released before every `.await`, so two
//! futures polled on the same task still see each other's guard.
//!
//! The refresh that follows a submission is never folded into one already in
//! flight: it waits for that one to finish and then sends its own request, so
//! the best time it reads postdates the submission. Dropping a `submit` or
//! `refresh_best_time` future mid-request leaves the controller ready for the
//! next attempt.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use super::events::{Event, EventBus};
use crate::backend::{BackendClient, BackendResult, FastestTimeResponse, SubmitResponse};
use crate::buffer::CodeBuffer;
use crate::error::{Result, SprintError, GENERIC_TRANSPORT_MESSAGE};
use crate::pairing::CursorPosition;
use crate::types::{BestTime, RenderedImage, SubmissionResult, SubmissionState};

/// Two-step "confirm reset" gesture
///
/// The first press arms it, the second press confirms. There is no timeout;
/// the gesture stays armed until it is confirmed or disarmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetConfirmation {
    armed: bool,
}

/// Result of pressing the reset trigger once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetStep {
    /// First press; ask the user to press again
    Armed,
    /// Second press; the caller should perform the reset
    Confirmed,
}

impl ResetConfirmation {
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn arm(&mut self) {
        self.armed = true;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Register one press of the reset trigger
    pub fn press(&mut self) -> ResetStep {
        if self.armed {
            ResetStep::Confirmed
        } else {
            self.armed = true;
            ResetStep::Armed
        }
    }
}

/// What a call to `submit` did
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Succeeded(SubmissionResult),
    Failed(String),
    /// A submission was already in flight; nothing was sent
    TriggerDisabled,
}

/// What a call to `refresh_best_time` did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshOutcome {
    Updated(BestTime),
    /// A refresh was already in flight; nothing was sent
    Skipped,
}

/// Point-in-time copy of everything a result view displays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSnapshot {
    pub state: SubmissionState,
    pub best_time: BestTime,
    /// Most recent error surfaced to the user, cleared when a submission starts
    pub error: Option<String>,
    pub last_completed_at: Option<DateTime<Utc>>,
    pub refreshing: bool,
}

impl ControllerSnapshot {
    pub fn can_submit(&self) -> bool {
        self.state.can_submit()
    }
}

/// Controller for submissions and best-time refreshes
pub struct SubmissionController {
    backend: Arc<dyn BackendClient>,
    buffer: Mutex<CodeBuffer>,
    state: Mutex<ControllerSnapshot>,
    /// Signalled whenever an in-flight refresh releases its slot
    refresh_done: Notify,
    event_bus: EventBus,
}

impl std::fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionController")
            .field("backend", &self.backend.name())
            .field("state", &self.snapshot())
            .finish_non_exhaustive()
    }
}

impl SubmissionController {
    pub fn new(backend: Arc<dyn BackendClient>, buffer: CodeBuffer, event_bus: EventBus) -> Self {
        Self {
            backend,
            buffer: Mutex::new(buffer),
            state: Mutex::new(ControllerSnapshot::default()),
            refresh_done: Notify::new(),
            event_bus,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_buffer(&self) -> MutexGuard<'_, CodeBuffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        self.lock_state().clone()
    }

    pub fn state(&self) -> SubmissionState {
        self.lock_state().state.clone()
    }

    pub fn best_time(&self) -> BestTime {
        self.lock_state().best_time
    }

    pub fn can_submit(&self) -> bool {
        self.lock_state().state.can_submit()
    }

    /// Current code text
    pub fn code(&self) -> String {
        self.lock_buffer().text().to_string()
    }

    /// Template the buffer resets to
    pub fn template(&self) -> String {
        self.lock_buffer().template().to_string()
    }

    /// Replace the code text (write-through)
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails. The new text is kept in
    /// memory either way.
    pub fn set_code(&self, text: impl Into<String>) -> Result<()> {
        self.lock_buffer().set(text)
    }

    /// Run bracket/quote pairing for one keystroke and commit the result
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn apply_keystroke(&self, key: char, cursor: CursorPosition) -> Result<Option<CursorPosition>> {
        self.lock_buffer().apply_keystroke(key, cursor)
    }

    /// First best-time refresh for a freshly opened session
    ///
    /// Errors are surfaced on the error channel and not returned.
    pub async fn initialize(&self, team_id: &str) {
        if let Err(e) = self.refresh_best_time(team_id).await {
            debug!("Initial best-time refresh failed: {}", e);
        }
    }

    /// Submit `code` for `team_id`
    ///
    /// Exactly one best-time refresh follows every submission that reached the
    /// backend, whatever its outcome.
    ///
    /// # Errors
    ///
    /// Returns `MissingTeamIdentity` when `team_id` is empty; no request is
    /// made in that case. Backend failures are not errors: they are reported
    /// as `SubmitOutcome::Failed`.
    pub async fn submit(&self, team_id: &str, code: &str) -> Result<SubmitOutcome> {
        if team_id.trim().is_empty() {
            self.surface_error(SprintError::MissingTeamIdentity.display_message());
            return Err(SprintError::MissingTeamIdentity);
        }

        {
            let mut state = self.lock_state();
            if state.state.is_submitting() {
                debug!("Submit ignored: a submission is already in flight");
                return Ok(SubmitOutcome::TriggerDisabled);
            }
            state.state = SubmissionState::Submitting;
            state.error = None;
        }

        let attempt_id = uuid::Uuid::new_v4().to_string();
        info!(attempt_id = %attempt_id, team_id, "Submitting {} chars of code", code.chars().count());
        self.event_bus.emit(Event::SubmissionStarted {
            attempt_id: attempt_id.clone(),
            team_id: team_id.to_string(),
        });

        let in_flight = SubmitGuard {
            controller: self,
            attempt_id: &attempt_id,
        };
        let response = self.backend.submit(team_id, code).await;
        let outcome = self.apply_submit_response(&attempt_id, response);
        drop(in_flight);

        if let Err(e) = self.refresh_after_submission(team_id).await {
            debug!("Best-time refresh after submission failed: {}", e);
        }

        Ok(outcome)
    }

    /// Submit whatever the code buffer currently holds
    ///
    /// # Errors
    ///
    /// See `submit`.
    pub async fn submit_current(&self, team_id: &str) -> Result<SubmitOutcome> {
        let code = self.code();
        self.submit(team_id, &code).await
    }

    fn apply_submit_response(&self, attempt_id: &str, response: BackendResult<SubmitResponse>) -> SubmitOutcome {
        let outcome = match response {
            Ok(body) if body.status.is_success() => match body.time_to_run {
                Some(elapsed) if elapsed.is_finite() && elapsed >= 0.0 => SubmitOutcome::Succeeded(SubmissionResult {
                    elapsed_seconds: elapsed,
                    image: RenderedImage::from_wire(body.image),
                    output: body.output,
                    submission_id: body.submission_id,
                }),
                other => {
                    warn!(attempt_id, "Success response with unusable time_to_run: {:?}", other);
                    SubmitOutcome::Failed(GENERIC_TRANSPORT_MESSAGE.to_string())
                }
            },
            Ok(body) => SubmitOutcome::Failed(
                body.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| GENERIC_TRANSPORT_MESSAGE.to_string()),
            ),
            Err(e) => {
                warn!(attempt_id, "Submission failed: {}", e);
                SubmitOutcome::Failed(e.display_message())
            }
        };

        {
            let mut state = self.lock_state();
            state.last_completed_at = Some(Utc::now());
            match &outcome {
                SubmitOutcome::Succeeded(result) => {
                    state.state = SubmissionState::Succeeded(result.clone());
                }
                SubmitOutcome::Failed(message) => {
                    state.state = SubmissionState::Failed(message.clone());
                    state.error = Some(message.clone());
                }
                SubmitOutcome::TriggerDisabled => {}
            }
        }

        match &outcome {
            SubmitOutcome::Succeeded(result) => {
                info!(attempt_id, "Submission ran in {} seconds", result.elapsed_seconds);
                self.event_bus.emit(Event::SubmissionSucceeded {
                    attempt_id: attempt_id.to_string(),
                    elapsed_seconds: result.elapsed_seconds,
                    image_produced: result.image.is_produced(),
                });
                if result.no_image_produced() {
                    self.event_bus.emit(Event::NoImageProduced {
                        attempt_id: attempt_id.to_string(),
                    });
                }
            }
            SubmitOutcome::Failed(message) => {
                self.event_bus.emit(Event::SubmissionFailed {
                    attempt_id: attempt_id.to_string(),
                    message: message.clone(),
                });
            }
            SubmitOutcome::TriggerDisabled => {}
        }

        outcome
    }

    /// Fetch the team's fastest time and store it
    ///
    /// Failures are surfaced on the error channel and never touch the
    /// submission state.
    ///
    /// # Errors
    ///
    /// Returns `MissingTeamIdentity` for an empty `team_id`, or the backend
    /// error when the read fails.
    pub async fn refresh_best_time(&self, team_id: &str) -> Result<RefreshOutcome> {
        if team_id.trim().is_empty() {
            self.surface_error(SprintError::MissingTeamIdentity.display_message());
            return Err(SprintError::MissingTeamIdentity);
        }

        match self.try_begin_refresh() {
            Some(slot) => self.fetch_best_time(team_id, slot).await,
            None => {
                debug!("Best-time refresh skipped: one is already in flight");
                Ok(RefreshOutcome::Skipped)
            }
        }
    }

    /// Refresh issued after a submission response has been processed
    ///
    /// Waits for an in-flight refresh instead of skipping, because that one
    /// was sent before the submission's result existed.
    async fn refresh_after_submission(&self, team_id: &str) -> Result<RefreshOutcome> {
        let slot = loop {
            let released = self.refresh_done.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed
            released.as_mut().enable();

            if let Some(slot) = self.try_begin_refresh() {
                break slot;
            }
            debug!("Waiting for the in-flight best-time refresh to finish");
            released.await;
        };
        self.fetch_best_time(team_id, slot).await
    }

    fn try_begin_refresh(&self) -> Option<RefreshSlot<'_>> {
        let mut state = self.lock_state();
        if state.refreshing {
            return None;
        }
        state.refreshing = true;
        Some(RefreshSlot {
            controller: self,
            released: false,
        })
    }

    async fn fetch_best_time(&self, team_id: &str, slot: RefreshSlot<'_>) -> Result<RefreshOutcome> {
        debug!(team_id, "Refreshing best time");
        let response = self.backend.fastest_time(team_id).await;
        self.apply_refresh_response(team_id, response, slot)
    }

    fn apply_refresh_response(
        &self,
        team_id: &str,
        response: BackendResult<FastestTimeResponse>,
        slot: RefreshSlot<'_>,
    ) -> Result<RefreshOutcome> {
        let result = match response {
            Ok(body) if body.status.is_success() => Ok(BestTime::from_wire(body.fastest_time)),
            Ok(body) => Err(SprintError::Backend(crate::error::BackendError::Rejected(
                body.message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| GENERIC_TRANSPORT_MESSAGE.to_string()),
            ))),
            Err(e) => Err(SprintError::Backend(e)),
        };

        match result {
            Ok(best_time) => {
                self.lock_state().best_time = best_time;
                slot.release();
                self.event_bus.emit(Event::BestTimeUpdated {
                    team_id: team_id.to_string(),
                    best_time: best_time.seconds(),
                });
                Ok(RefreshOutcome::Updated(best_time))
            }
            Err(e) => {
                warn!(team_id, "Best-time refresh failed: {}", e);
                let message = e.display_message();
                self.lock_state().error = Some(message.clone());
                slot.release();
                self.event_bus.emit(Event::Error { message });
                Err(e)
            }
        }
    }

    /// Put `template` back into the code buffer
    ///
    /// Clears the confirmation gesture and reports on the notification
    /// channel. Calling it again with the same template changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn reset(&self, template: &str, confirmation: &mut ResetConfirmation) -> Result<()> {
        confirmation.disarm();
        self.lock_buffer().reset(template)?;
        info!("Code reset to template");
        self.event_bus.emit(Event::CodeReset);
        Ok(())
    }

    /// `reset` with the buffer's own template
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub fn reset_to_template(&self, confirmation: &mut ResetConfirmation) -> Result<()> {
        let template = self.template();
        self.reset(&template, confirmation)
    }

    fn surface_error(&self, message: String) {
        self.lock_state().error = Some(message.clone());
        self.event_bus.emit(Event::Error { message });
    }
}

/// Marks a submission request as in flight
///
/// If the future is dropped before the response is applied, the attempt is
/// recorded as failed and the trigger is re-enabled.
struct SubmitGuard<'a> {
    controller: &'a SubmissionController,
    attempt_id: &'a str,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        {
            let mut state = self.controller.lock_state();
            if !state.state.is_submitting() {
                return;
            }
            state.state = SubmissionState::Failed(GENERIC_TRANSPORT_MESSAGE.to_string());
            state.error = Some(GENERIC_TRANSPORT_MESSAGE.to_string());
            state.last_completed_at = Some(Utc::now());
        }
        warn!(attempt_id = self.attempt_id, "Submission abandoned before a response arrived");
        self.controller.event_bus.emit(Event::SubmissionFailed {
            attempt_id: self.attempt_id.to_string(),
            message: GENERIC_TRANSPORT_MESSAGE.to_string(),
        });
    }
}

/// The single best-time refresh slot, held while a request is in flight
struct RefreshSlot<'a> {
    controller: &'a SubmissionController,
    released: bool,
}

impl RefreshSlot<'_> {
    fn release(mut self) {
        self.free();
    }

    fn free(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.controller.lock_state().refreshing = false;
        self.controller.refresh_done.notify_waiters();
    }
}

impl Drop for RefreshSlot<'_> {
    fn drop(&mut self) {
        self.free();
    }
}
