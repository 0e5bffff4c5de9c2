//! Slot-search requests and results.

use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::ParticipantSelectionSet;
use crate::time::{TimeInterval, hhmm};

/// A slot search needs at least this many required participants.
pub const MIN_REQUIRED_PARTICIPANTS: usize = 2;

/// Buffer applied between meetings unless disabled.
pub const DEFAULT_BUFFER_MINUTES: u32 = 10;

/// Meeting length used when none is given.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Blackout list errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlackoutError {
    #[error("This blocked time already exists")]
    Duplicate,

    #[error("no blocked time at position {index}")]
    OutOfRange { index: usize },
}

/// Errors building a slot-search request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Select at least 2 required participants")]
    TooFewRequired { count: usize },

    #[error("meeting duration must be at least one minute")]
    ZeroDuration,
}

/// Time ranges excluded from every slot search, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlackoutList {
    entries: Vec<TimeInterval>,
}

impl BlackoutList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a blackout; exact duplicates are rejected.
    pub fn add(&mut self, interval: TimeInterval) -> Result<(), BlackoutError> {
        if self.entries.contains(&interval) {
            return Err(BlackoutError::Duplicate);
        }
        self.entries.push(interval);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<TimeInterval, BlackoutError> {
        if index >= self.entries.len() {
            return Err(BlackoutError::OutOfRange { index });
        }
        Ok(self.entries.remove(index))
    }

    pub fn as_slice(&self) -> &[TimeInterval] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Duration and buffer settings for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeetingOptions {
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    /// Sends a zero buffer regardless of `buffer_minutes`.
    pub no_buffer: bool,
}

impl Default for MeetingOptions {
    fn default() -> Self {
        Self {
            duration_minutes: DEFAULT_DURATION_MINUTES,
            buffer_minutes: DEFAULT_BUFFER_MINUTES,
            no_buffer: false,
        }
    }
}

impl MeetingOptions {
    pub const fn effective_buffer_minutes(&self) -> u32 {
        if self.no_buffer { 0 } else { self.buffer_minutes }
    }
}

/// Body of `POST /api/meeting-request`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub duration_minutes: u32,
    pub buffer_minutes: u32,
    pub blackouts: Vec<TimeInterval>,
}

impl MeetingRequest {
    /// Builds a request from the current selection.
    pub fn build(
        selection: &ParticipantSelectionSet,
        options: &MeetingOptions,
        blackouts: &BlackoutList,
    ) -> Result<Self, RequestError> {
        let required: Vec<String> = selection
            .required_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        if required.len() < MIN_REQUIRED_PARTICIPANTS {
            return Err(RequestError::TooFewRequired {
                count: required.len(),
            });
        }
        if options.duration_minutes == 0 {
            return Err(RequestError::ZeroDuration);
        }

        Ok(Self {
            required,
            optional: selection
                .optional_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            duration_minutes: options.duration_minutes,
            buffer_minutes: options.effective_buffer_minutes(),
            blackouts: blackouts.as_slice().to_vec(),
        })
    }
}

/// One candidate meeting start returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableSlot {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// Older servers send only the start.
    #[serde(
        default,
        with = "hhmm::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<NaiveTime>,
    #[serde(default)]
    pub available_optional: Vec<String>,
    #[serde(default)]
    pub unavailable_optional: Vec<String>,
}

impl AvailableSlot {
    /// The slot as an interval, deriving the end from the meeting duration
    /// when the server omitted it. `None` if the slot would cross midnight.
    pub fn interval(&self, duration_minutes: u32) -> Option<TimeInterval> {
        let end = self.end.or_else(|| {
            let (end, wrapped) = self
                .start
                .overflowing_add_signed(Duration::minutes(i64::from(duration_minutes)));
            (wrapped == 0).then_some(end)
        })?;
        TimeInterval::new(self.start, end).ok()
    }
}

/// Body of the `POST /api/meeting-request` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSearchResult {
    #[serde(default)]
    pub slots: Vec<AvailableSlot>,
}

impl SlotSearchResult {
    /// Heading shown above the slot list.
    pub fn summary(&self, required_count: usize) -> String {
        if self.slots.is_empty() {
            "No available slots found for all required participants".to_string()
        } else {
            format!(
                "Found {} available slot(s) for {required_count} required participant(s):",
                self.slots.len()
            )
        }
    }

    /// Slot intervals for the timeline overlay.
    pub fn intervals(&self, duration_minutes: u32) -> Vec<TimeInterval> {
        self.slots
            .iter()
            .filter_map(|slot| slot.interval(duration_minutes))
            .collect()
    }
}
