//! Status command for showing loaded participants and their busy times.

use std::io::Write;

use anyhow::Result;

use slotify_client::Client;
use slotify_core::{DisplayWindow, PlannerState};

use crate::render;

pub async fn run<W: Write>(writer: &mut W, client: &Client, window: DisplayWindow) -> Result<()> {
    let planner = super::load_planner(client).await?;
    write_state(writer, &planner, window)
}

/// Writes the participant summary and timeline, or a notice when nothing
/// is loaded.
pub fn write_state<W: Write>(
    writer: &mut W,
    planner: &PlannerState,
    window: DisplayWindow,
) -> Result<()> {
    if !planner.has_data() {
        writeln!(writer, "No calendar data loaded.")?;
        return Ok(());
    }

    writeln!(writer, "Loaded {}", planner.participant_summary())?;
    writeln!(writer)?;
    write!(
        writer,
        "{}",
        render::timeline(&planner.timeline(window), render::TIMELINE_WIDTH)
    )?;
    Ok(())
}
