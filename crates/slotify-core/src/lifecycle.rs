//! Upload lifecycle state machine.
//!
//! ```text
//! Idle --file--> Submitting --stream opened--> Streaming --done--> Completed
//!                    |                             |
//!                    +--rejected / transport-------+--error / transport / cancel--> Failed
//! ```
//!
//! One [`UploadLifecycle`] is created per attempt. It has no I/O of its
//! own: the driver reports response outcomes and decoded frames, and reads
//! back the state and status message.
//!
//! The upload trigger is modelled by [`TriggerControl`]. Engaging it hands
//! out a [`TriggerGuard`] that restores the idle label and re-enables the
//! control when dropped, on every exit path.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::availability::AvailabilitySnapshot;
use crate::frame::{EventFrame, FrameKind};

/// Shown on the trigger while an upload is in flight.
pub const UPLOAD_BUSY_LABEL: &str = "Uploading...";

/// Why an upload attempt did not complete.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// No file was chosen; the attempt never left `Idle`.
    #[error("Select a file first")]
    MissingFile,

    /// Another upload holds the trigger.
    #[error("an upload is already in progress")]
    InFlight,

    /// The server rejected the request before streaming.
    #[error("{0}")]
    Validation(String),

    /// Network failure, or a non-success status without a structured body.
    #[error("{0}")]
    Transport(String),

    /// The server reported an error mid-stream.
    #[error("{0}")]
    Stream(String),

    /// A recognized frame carried a payload that could not be parsed.
    #[error("invalid {frame} payload: {reason}")]
    Payload { frame: &'static str, reason: String },

    #[error("upload cancelled")]
    Cancelled,

    /// The stream closed before a `done` or `error` frame arrived.
    #[error("upload stream ended before a result was received")]
    Incomplete,
}

/// Where an upload attempt currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Submitting,
    Streaming,
    Completed(AvailabilitySnapshot),
    Failed(UploadError),
}

impl UploadState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting => "submitting",
            Self::Streaming => "streaming",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A calendar export chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("bytes", &self.content.len())
            .finish()
    }
}

/// Status line and content type of the upload response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub content_type: Option<String>,
}

impl ResponseHead {
    /// Whether the server answered without a stream: a non-success status,
    /// or any JSON body.
    pub fn is_rejection(&self) -> bool {
        let success = (200..300).contains(&self.status);
        let json = self
            .content_type
            .as_deref()
            .is_some_and(|value| value.contains("application/json"));
        !success || json
    }
}

/// What a single frame did to the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The status message changed.
    Progress,
    Completed,
    Failed,
    /// Unrecognized frame, or the lifecycle is not streaming.
    Ignored,
}

#[derive(Deserialize)]
struct ProgressPayload {
    message: String,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    error: Option<String>,
}

/// State machine for one upload attempt.
#[derive(Debug, Clone, Default)]
pub struct UploadLifecycle {
    state: UploadState,
    message: String,
}

impl UploadLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &UploadState {
        &self.state
    }

    /// Human-readable status for the current state.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Starts the attempt. Without a file the lifecycle stays `Idle` and
    /// records the validation message; the file is handed back otherwise.
    pub fn begin(&mut self, file: Option<UploadFile>) -> Option<UploadFile> {
        if !matches!(self.state, UploadState::Idle) {
            warn!(state = %self.state, "upload already started");
            return None;
        }
        let Some(file) = file else {
            self.message = UploadError::MissingFile.to_string();
            return None;
        };
        self.transition(UploadState::Submitting, UPLOAD_BUSY_LABEL.to_string());
        Some(file)
    }

    /// The server answered without a stream. A structured `{error}` body is
    /// a validation failure; anything else is reported by status.
    pub fn on_rejected(&mut self, status: u16, body: &str) {
        let error = serde_json::from_str::<ErrorPayload>(body)
            .ok()
            .and_then(|payload| payload.error)
            .map_or_else(
                || UploadError::Transport(format!("Server error: {status}")),
                UploadError::Validation,
            );
        self.fail(error);
    }

    /// The server answered with a streaming body.
    pub fn on_stream_opened(&mut self) {
        if matches!(self.state, UploadState::Submitting) {
            let message = self.message.clone();
            self.transition(UploadState::Streaming, message);
        }
    }

    /// Applies one decoded frame.
    pub fn on_frame(&mut self, frame: &EventFrame) -> FrameOutcome {
        if !matches!(self.state, UploadState::Streaming) {
            debug!(event = %frame.event, state = %self.state, "ignoring frame outside streaming");
            return FrameOutcome::Ignored;
        }

        match frame.kind() {
            FrameKind::Progress => match serde_json::from_str::<ProgressPayload>(&frame.data) {
                Ok(payload) => {
                    debug!(message = %payload.message, "upload progress");
                    self.message = payload.message;
                    FrameOutcome::Progress
                }
                Err(err) => self.fail_payload("progress", &err),
            },
            FrameKind::Done => match serde_json::from_str::<AvailabilitySnapshot>(&frame.data) {
                Ok(snapshot) => {
                    let message = format!("{} participants", snapshot.participants.len());
                    self.transition(UploadState::Completed(snapshot), message);
                    FrameOutcome::Completed
                }
                Err(err) => self.fail_payload("done", &err),
            },
            FrameKind::Error => match serde_json::from_str::<ErrorPayload>(&frame.data) {
                Ok(payload) => {
                    let message = payload.error.unwrap_or_else(|| "upload failed".to_string());
                    self.fail(UploadError::Stream(message));
                    FrameOutcome::Failed
                }
                Err(err) => self.fail_payload("error", &err),
            },
            FrameKind::Unrecognized => {
                debug!(event = %frame.event, "ignoring unrecognized frame");
                FrameOutcome::Ignored
            }
        }
    }

    /// The request or a body read failed at the network level.
    pub fn on_transport_error(&mut self, message: impl Into<String>) {
        self.fail(UploadError::Transport(message.into()));
    }

    /// The body ended. Only meaningful while still streaming.
    pub fn on_end_of_stream(&mut self) {
        if matches!(self.state, UploadState::Streaming) {
            self.fail(UploadError::Incomplete);
        }
    }

    pub fn cancel(&mut self) {
        self.fail(UploadError::Cancelled);
    }

    /// Moves to `Failed` unless the attempt already terminated.
    pub fn fail(&mut self, error: UploadError) {
        if self.is_terminal() {
            debug!(%error, state = %self.state, "ignoring failure after termination");
            return;
        }
        warn!(%error, "upload failed");
        let message = error.to_string();
        self.transition(UploadState::Failed(error), message);
    }

    /// Consumes the attempt, yielding the published snapshot on success.
    pub fn into_outcome(self) -> Result<AvailabilitySnapshot, UploadError> {
        match self.state {
            UploadState::Completed(snapshot) => Ok(snapshot),
            UploadState::Failed(error) => Err(error),
            UploadState::Idle => Err(UploadError::MissingFile),
            UploadState::Submitting | UploadState::Streaming => Err(UploadError::Incomplete),
        }
    }

    fn fail_payload(&mut self, frame: &'static str, err: &serde_json::Error) -> FrameOutcome {
        self.fail(UploadError::Payload {
            frame,
            reason: err.to_string(),
        });
        FrameOutcome::Failed
    }

    fn transition(&mut self, next: UploadState, message: String) {
        debug!(from = %self.state, to = %next, "upload state change");
        self.state = next;
        self.message = message;
    }
}

/// The control that starts uploads: a label plus an enabled flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerControl {
    label: String,
    enabled: bool,
}

impl Default for TriggerControl {
    fn default() -> Self {
        Self::new("Upload")
    }
}

impl TriggerControl {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            enabled: true,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disables the control for the duration of an upload.
    pub fn engage(&mut self, busy_label: &str) -> Result<TriggerGuard<'_>, UploadError> {
        if !self.enabled {
            return Err(UploadError::InFlight);
        }
        let restore = std::mem::replace(&mut self.label, busy_label.to_string());
        self.enabled = false;
        Ok(TriggerGuard {
            control: self,
            restore,
        })
    }
}

/// Holds the trigger disabled; restores it on drop.
#[derive(Debug)]
pub struct TriggerGuard<'a> {
    control: &'a mut TriggerControl,
    restore: String,
}

impl TriggerGuard<'_> {
    /// Shows progress text on the disabled control.
    pub fn set_label(&mut self, label: &str) {
        label.clone_into(&mut self.control.label);
    }

    pub fn label(&self) -> &str {
        &self.control.label
    }
}

impl Drop for TriggerGuard<'_> {
    fn drop(&mut self) {
        self.control.label = std::mem::take(&mut self.restore);
        self.control.enabled = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> UploadFile {
        UploadFile {
            file_name: "calendar.csv".to_string(),
            content: b"Alice,Standup,9:00,9:30\n".to_vec(),
        }
    }

    fn streaming() -> UploadLifecycle {
        let mut lifecycle = UploadLifecycle::new();
        lifecycle.begin(Some(file())).unwrap();
        lifecycle.on_stream_opened();
        lifecycle
    }

    #[test]
    fn missing_file_stays_idle_with_message() {
        let mut lifecycle = UploadLifecycle::new();
        assert!(lifecycle.begin(None).is_none());
        assert_eq!(lifecycle.state(), &UploadState::Idle);
        assert_eq!(lifecycle.message(), "Select a file first");
        assert_eq!(lifecycle.into_outcome(), Err(UploadError::MissingFile));
    }

    #[test]
    fn begin_moves_to_submitting() {
        let mut lifecycle = UploadLifecycle::new();
        let handed_back = lifecycle.begin(Some(file())).unwrap();
        assert_eq!(handed_back.file_name, "calendar.csv");
        assert_eq!(lifecycle.state(), &UploadState::Submitting);
        assert_eq!(lifecycle.message(), UPLOAD_BUSY_LABEL);
    }

    #[test]
    fn rejection_uses_error_payload() {
        let mut lifecycle = UploadLifecycle::new();
        lifecycle.begin(Some(file()));
        lifecycle.on_rejected(400, r#"{"error":"bad file"}"#);
        assert_eq!(
            lifecycle.state(),
            &UploadState::Failed(UploadError::Validation("bad file".to_string()))
        );
        assert_eq!(lifecycle.message(), "bad file");
    }

    #[test]
    fn rejection_without_error_field_uses_status() {
        let mut lifecycle = UploadLifecycle::new();
        lifecycle.begin(Some(file()));
        lifecycle.on_rejected(502, "<html>Bad Gateway</html>");
        assert_eq!(lifecycle.message(), "Server error: 502");
    }

    #[test]
    fn rejection_without_error_field_is_a_transport_failure() {
        let mut lifecycle = UploadLifecycle::new();
        lifecycle.begin(Some(file()));
        lifecycle.on_rejected(502, "<html>Bad Gateway</html>");
        assert_eq!(
            lifecycle.into_outcome(),
            Err(UploadError::Transport("Server error: 502".to_string()))
        );

        let mut unstructured = UploadLifecycle::new();
        unstructured.begin(Some(file()));
        unstructured.on_rejected(400, r#"{"detail":"nope"}"#);
        assert!(matches!(
            unstructured.state(),
            UploadState::Failed(UploadError::Transport(_))
        ));
    }

    #[test]
    fn unterminated_done_frame_ends_incomplete() {
        let mut decoder = crate::frame::FrameDecoder::new();
        let mut lifecycle = streaming();
        let frames = decoder.feed(br#"event: done
data: {"busySlots":{},"participants":[]}
"#);
        assert!(frames.is_empty());

        assert!(decoder.finish() > 0);
        lifecycle.on_end_of_stream();
        assert_eq!(lifecycle.state(), &UploadState::Failed(UploadError::Incomplete));
        assert_eq!(
            lifecycle.message(),
            "upload stream ended before a result was received"
        );
    }

    #[test]
    fn response_head_classification() {
        let head = |status, content_type: Option<&str>| ResponseHead {
            status,
            content_type: content_type.map(str::to_string),
        };
        assert!(!head(200, Some("text/event-stream")).is_rejection());
        assert!(!head(200, None).is_rejection());
        assert!(head(200, Some("application/json; charset=utf-8")).is_rejection());
        assert!(head(400, Some("text/event-stream")).is_rejection());
        assert!(head(500, None).is_rejection());
    }

    #[test]
    fn progress_updates_message_only() {
        let mut lifecycle = streaming();
        let outcome = lifecycle.on_frame(&EventFrame::new("progress", r#"{"message":"50%"}"#));
        assert_eq!(outcome, FrameOutcome::Progress);
        assert_eq!(lifecycle.state(), &UploadState::Streaming);
        assert_eq!(lifecycle.message(), "50%");
    }

    #[test]
    fn done_publishes_snapshot() {
        let mut lifecycle = streaming();
        let outcome = lifecycle.on_frame(&EventFrame::new(
            "done",
            r#"{"busySlots":{"Alice":[{"start":"09:00","end":"09:30"}]},"participants":["Alice","Bob"]}"#,
        ));
        assert_eq!(outcome, FrameOutcome::Completed);
        assert_eq!(lifecycle.message(), "2 participants");

        let snapshot = lifecycle.into_outcome().unwrap();
        assert_eq!(snapshot.participants, vec!["Alice", "Bob"]);
        assert_eq!(snapshot.busy_slots.busy_for("Alice").len(), 1);
    }

    #[test]
    fn error_frame_fails_with_server_message() {
        let mut lifecycle = streaming();
        let outcome = lifecycle.on_frame(&EventFrame::new("error", r#"{"error":"line 3: bad time"}"#));
        assert_eq!(outcome, FrameOutcome::Failed);
        assert_eq!(
            lifecycle.into_outcome(),
            Err(UploadError::Stream("line 3: bad time".to_string()))
        );
    }

    #[test]
    fn malformed_payload_fails() {
        let mut lifecycle = streaming();
        let outcome = lifecycle.on_frame(&EventFrame::new("progress", "not json"));
        assert_eq!(outcome, FrameOutcome::Failed);
        assert!(matches!(
            lifecycle.state(),
            UploadState::Failed(UploadError::Payload {
                frame: "progress",
                ..
            })
        ));
    }

    #[test]
    fn unrecognized_frames_are_ignored() {
        let mut lifecycle = streaming();
        assert_eq!(
            lifecycle.on_frame(&EventFrame::new("", "{}")),
            FrameOutcome::Ignored
        );
        assert_eq!(
            lifecycle.on_frame(&EventFrame::new("heartbeat", "")),
            FrameOutcome::Ignored
        );
        assert_eq!(lifecycle.state(), &UploadState::Streaming);
    }

    #[test]
    fn frames_after_termination_are_ignored() {
        let mut lifecycle = streaming();
        lifecycle.on_frame(&EventFrame::new("done", r#"{"busySlots":{},"participants":[]}"#));
        let outcome = lifecycle.on_frame(&EventFrame::new("error", r#"{"error":"late"}"#));
        assert_eq!(outcome, FrameOutcome::Ignored);
        assert!(lifecycle.into_outcome().is_ok());
    }

    #[test]
    fn end_of_stream_without_result_is_incomplete() {
        let mut lifecycle = streaming();
        lifecycle.on_end_of_stream();
        assert_eq!(lifecycle.into_outcome(), Err(UploadError::Incomplete));
    }

    #[test]
    fn transport_error_and_cancel_fail() {
        let mut lifecycle = streaming();
        lifecycle.on_transport_error("connection reset");
        assert_eq!(lifecycle.message(), "connection reset");

        let mut cancelled = streaming();
        cancelled.cancel();
        assert_eq!(cancelled.into_outcome(), Err(UploadError::Cancelled));
    }

    #[test]
    fn trigger_guard_restores_on_drop() {
        let mut trigger = TriggerControl::new("Upload");
        {
            let mut guard = trigger.engage(UPLOAD_BUSY_LABEL).unwrap();
            assert_eq!(guard.label(), UPLOAD_BUSY_LABEL);
            guard.set_label("Parsing calendar");
            assert_eq!(guard.label(), "Parsing calendar");
        }
        assert!(trigger.is_enabled());
        assert_eq!(trigger.label(), "Upload");
    }

    #[test]
    fn trigger_guard_restores_on_early_return() {
        fn attempt(trigger: &mut TriggerControl) -> Result<(), UploadError> {
            let _guard = trigger.engage(UPLOAD_BUSY_LABEL)?;
            Err(UploadError::Transport("refused".to_string()))
        }

        let mut trigger = TriggerControl::default();
        assert!(attempt(&mut trigger).is_err());
        assert!(trigger.is_enabled());
        assert_eq!(trigger.label(), "Upload");
    }

    #[test]
    fn leaked_guard_blocks_second_upload() {
        let mut trigger = TriggerControl::default();
        std::mem::forget(trigger.engage(UPLOAD_BUSY_LABEL).unwrap());
        assert!(!trigger.is_enabled());
        assert_eq!(
            trigger.engage(UPLOAD_BUSY_LABEL).unwrap_err(),
            UploadError::InFlight
        );
    }
}
