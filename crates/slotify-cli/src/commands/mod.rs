//! CLI subcommand implementations.

pub mod clear;
pub mod find;
pub mod status;
pub mod upload;

use anyhow::{Context, Result};

use slotify_client::Client;
use slotify_core::PlannerState;

/// Builds a planner from whatever the server currently holds.
pub(crate) async fn load_planner(client: &Client) -> Result<PlannerState> {
    let state = client
        .load_state()
        .await
        .with_context(|| format!("failed to load state from {}", client.base_url()))?;
    let mut planner = PlannerState::new();
    planner.restore(state);
    Ok(planner)
}
