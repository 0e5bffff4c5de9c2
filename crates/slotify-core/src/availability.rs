//! Participant busy intervals and their projection onto a display window.
//!
//! Every time of day is normalized into a 0-100 percentage scale over
//! `[start_hour, end_hour)`. Times outside the window are clamped to the
//! nearest edge, so an interval lying wholly outside renders as a
//! zero-width block at that edge. The projection is lossy on purpose.

use std::collections::BTreeMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selection::{Category, ParticipantSelectionSet};
use crate::time::{TimeInterval, minutes_since_midnight};

/// Hours in a day; the latest a window may end.
const DAY_HOURS: u32 = 24;

/// Display window errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("display window must end after it starts ({start_hour}:00 >= {end_hour}:00)")]
    Empty { start_hour: u32, end_hour: u32 },

    #[error("display window cannot end after 24:00 (got {end_hour}:00)")]
    PastMidnight { end_hour: u32 },
}

/// Busy intervals keyed by participant name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantAvailability(BTreeMap<String, Vec<TimeInterval>>);

impl ParticipantAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the busy intervals of one participant.
    pub fn insert(&mut self, name: impl Into<String>, busy: Vec<TimeInterval>) {
        self.0.insert(name.into(), busy);
    }

    /// Busy intervals for `name`; empty when the participant has none.
    pub fn busy_for(&self, name: &str) -> &[TimeInterval] {
        self.0.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Availability and participant list published by a completed upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySnapshot {
    #[serde(default)]
    pub busy_slots: ParticipantAvailability,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Horizontal placement of an interval, in percent of the window width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub left_percent: f64,
    pub width_percent: f64,
}

impl Projection {
    pub fn right_percent(&self) -> f64 {
        self.left_percent + self.width_percent
    }

    /// Whether `percent` falls inside `[left, right)`.
    pub fn covers(&self, percent: f64) -> bool {
        percent >= self.left_percent && percent < self.right_percent()
    }
}

/// Fixed hour range `[start_hour, end_hour)` used for normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayWindow {
    start_hour: u32,
    end_hour: u32,
}

impl Default for DisplayWindow {
    fn default() -> Self {
        Self {
            start_hour: 7,
            end_hour: 19,
        }
    }
}

impl DisplayWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Result<Self, WindowError> {
        if end_hour > DAY_HOURS {
            return Err(WindowError::PastMidnight { end_hour });
        }
        if start_hour >= end_hour {
            return Err(WindowError::Empty {
                start_hour,
                end_hour,
            });
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    pub const fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub const fn end_hour(&self) -> u32 {
        self.end_hour
    }

    pub const fn duration_minutes(&self) -> u32 {
        (self.end_hour - self.start_hour) * 60
    }

    /// Position of `time` within the window, clamped to `[0, 100]`.
    pub fn percent_of(&self, time: NaiveTime) -> f64 {
        let offset = minutes_since_midnight(time) - f64::from(self.start_hour * 60);
        (offset / f64::from(self.duration_minutes()) * 100.0).clamp(0.0, 100.0)
    }

    /// Projects an interval; see [`project`].
    pub fn project(&self, interval: &TimeInterval) -> Projection {
        let left_percent = self.percent_of(interval.start());
        Projection {
            left_percent,
            width_percent: self.percent_of(interval.end()) - left_percent,
        }
    }

    /// Zero-padded hour labels from the start hour through the end hour.
    pub fn hour_labels(&self) -> Vec<String> {
        (self.start_hour..=self.end_hour)
            .map(|hour| format!("{hour:02}"))
            .collect()
    }
}

/// Projects `interval` onto `window`.
///
/// `left = clamp((start - window.start) / window.duration * 100, 0, 100)` and
/// `width = clamp(end projected the same way) - left`.
pub fn project(interval: &TimeInterval, window: &DisplayWindow) -> Projection {
    window.project(interval)
}

/// One available-slot marker drawn over a participant row.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMarker {
    pub participant: String,
    pub projection: Projection,
}

/// Slot highlights drawn over every participant row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotOverlay {
    markers: Vec<OverlayMarker>,
}

impl SlotOverlay {
    /// Replaces all markers: one per participant row per slot.
    ///
    /// Previous markers are always removed first, so repeating the call with
    /// the same input leaves the same overlay.
    pub fn highlight_slots(
        &mut self,
        participants: &[String],
        slots: &[TimeInterval],
        window: &DisplayWindow,
    ) {
        self.markers.clear();
        for slot in slots {
            let projection = window.project(slot);
            for participant in participants {
                self.markers.push(OverlayMarker {
                    participant: participant.clone(),
                    projection,
                });
            }
        }
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn markers(&self) -> &[OverlayMarker] {
        &self.markers
    }

    /// Markers on one participant row.
    pub fn markers_for<'a>(&'a self, participant: &'a str) -> impl Iterator<Item = &'a Projection> {
        self.markers
            .iter()
            .filter(move |marker| marker.participant == participant)
            .map(|marker| &marker.projection)
    }
}

/// One timeline row: a participant, how they are classified, and their
/// projected busy blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub name: String,
    pub category: Category,
    pub busy: Vec<Projection>,
}

/// Everything a renderer needs to draw the availability timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub window: DisplayWindow,
    pub hours: Vec<String>,
    pub rows: Vec<TimelineRow>,
    pub overlay: SlotOverlay,
}

impl Timeline {
    /// Builds rows in participant-list order, colored by the selection.
    pub fn build(
        participants: &[String],
        availability: &ParticipantAvailability,
        selection: &ParticipantSelectionSet,
        overlay: &SlotOverlay,
        window: DisplayWindow,
    ) -> Self {
        let rows = participants
            .iter()
            .map(|name| TimelineRow {
                name: name.clone(),
                category: selection.category(name),
                busy: availability
                    .busy_for(name)
                    .iter()
                    .map(|interval| window.project(interval))
                    .collect(),
            })
            .collect();

        Self {
            window,
            hours: window.hour_labels(),
            rows,
            overlay: overlay.clone(),
        }
    }
}
