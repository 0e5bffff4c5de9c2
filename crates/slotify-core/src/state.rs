//! Planner state owned by a single controller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::availability::{
    AvailabilitySnapshot, DisplayWindow, ParticipantAvailability, SlotOverlay, Timeline,
};
use crate::lifecycle::TriggerControl;
use crate::request::{BlackoutList, SlotSearchResult};
use crate::selection::ParticipantSelectionSet;

/// Body of `GET /api/state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub busy_slots: ParticipantAvailability,
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Everything the planner keeps between user actions.
///
/// Availability and the participant list are only ever replaced as a whole
/// ([`PlannerState::adopt`]) or cleared ([`PlannerState::reset`]). A new
/// participant list invalidates the current selection.
#[derive(Debug, Clone, Default)]
pub struct PlannerState {
    availability: ParticipantAvailability,
    participants: Vec<String>,
    pub selection: ParticipantSelectionSet,
    pub blackouts: BlackoutList,
    pub trigger: TriggerControl,
    overlay: SlotOverlay,
}

impl PlannerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn availability(&self) -> &ParticipantAvailability {
        &self.availability
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn has_data(&self) -> bool {
        !self.participants.is_empty()
    }

    /// `"N participants"`, as shown after a load.
    pub fn participant_summary(&self) -> String {
        format!("{} participants", self.participants.len())
    }

    /// Replaces availability and participants with a completed upload.
    pub fn adopt(&mut self, snapshot: AvailabilitySnapshot) {
        if snapshot.participants != self.participants {
            debug!(
                participants = snapshot.participants.len(),
                "participant list changed, clearing selection"
            );
            self.selection = ParticipantSelectionSet::new(snapshot.participants.clone());
        }
        self.availability = snapshot.busy_slots;
        self.participants = snapshot.participants;
        self.overlay.clear();
    }

    /// Adopts server-held state if the server has any.
    pub fn restore(&mut self, state: ServerState) {
        if state.has_data {
            self.adopt(AvailabilitySnapshot {
                busy_slots: state.busy_slots,
                participants: state.participants,
            });
        }
    }

    /// Clears availability, participants, selection and highlights.
    /// Blackouts are caller settings and survive.
    pub fn reset(&mut self) {
        self.availability = ParticipantAvailability::default();
        self.participants.clear();
        self.selection = ParticipantSelectionSet::default();
        self.overlay.clear();
    }

    /// Highlights the slots of a search result on every participant row.
    pub fn highlight(
        &mut self,
        result: &SlotSearchResult,
        duration_minutes: u32,
        window: &DisplayWindow,
    ) {
        let slots = result.intervals(duration_minutes);
        self.overlay
            .highlight_slots(&self.participants, &slots, window);
    }

    pub const fn overlay(&self) -> &SlotOverlay {
        &self.overlay
    }

    /// Projects the current state onto `window`.
    pub fn timeline(&self, window: DisplayWindow) -> Timeline {
        Timeline::build(
            &self.participants,
            &self.availability,
            &self.selection,
            &self.overlay,
            window,
        )
    }
}
