//! Core domain logic for the slotify meeting planner.
//!
//! This crate contains the I/O-free parts of the planner:
//! - Frame decoding: turning chunked upload response bytes into event frames
//! - Upload lifecycle: the per-attempt state machine driven by those frames
//! - Availability: busy intervals and their projection onto a display window
//! - Selection: required/optional participant classification
//! - Requests: blackouts, slot-search requests and their results

pub mod availability;
pub mod frame;
pub mod lifecycle;
pub mod request;
pub mod selection;
mod state;
pub mod time;

pub use availability::{
    AvailabilitySnapshot, DisplayWindow, ParticipantAvailability, Projection, SlotOverlay,
    Timeline, TimelineRow, WindowError, project,
};
pub use frame::{EventFrame, FrameDecoder, FrameKind};
pub use lifecycle::{
    FrameOutcome, ResponseHead, TriggerControl, TriggerGuard, UPLOAD_BUSY_LABEL, UploadError,
    UploadFile, UploadLifecycle, UploadState,
};
pub use request::{
    AvailableSlot, BlackoutError, BlackoutList, MeetingOptions, MeetingRequest, RequestError,
    SlotSearchResult,
};
pub use selection::{Category, ParticipantSelectionSet, SelectionError};
pub use state::{PlannerState, ServerState};
pub use time::{TimeError, TimeInterval};
