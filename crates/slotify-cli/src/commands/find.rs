//! Find command for searching meeting slots.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;

use slotify_client::Client;
use slotify_core::{Category, DisplayWindow, MeetingOptions, MeetingRequest, PlannerState, TimeInterval};

use crate::{Config, render};

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Participant who must be free (repeatable).
    #[arg(short, long, value_name = "NAME")]
    pub required: Vec<String>,

    /// Participant whose availability is reported but not enforced (repeatable).
    #[arg(short, long, value_name = "NAME")]
    pub optional: Vec<String>,

    /// Meeting length in minutes.
    #[arg(short, long, value_name = "MINUTES")]
    pub duration: Option<u32>,

    /// Gap to keep around other meetings, in minutes.
    #[arg(short, long, value_name = "MINUTES", conflicts_with = "no_buffer")]
    pub buffer: Option<u32>,

    /// Do not keep a gap around other meetings.
    #[arg(long)]
    pub no_buffer: bool,

    /// Time range no meeting may overlap, e.g. 12:00-13:00 (repeatable).
    #[arg(long = "blackout", value_name = "HH:MM-HH:MM")]
    pub blackouts: Vec<TimeInterval>,

    /// Also draw the found slots on the availability timeline.
    #[arg(long)]
    pub timeline: bool,
}

pub async fn run<W: Write>(
    writer: &mut W,
    client: &Client,
    args: &FindArgs,
    config: &Config,
    window: DisplayWindow,
) -> Result<()> {
    let mut planner = super::load_planner(client).await?;
    if !planner.has_data() {
        bail!("no calendar data loaded; upload a calendar first");
    }

    let request = prepare_request(&mut planner, args, config)?;
    let result = client
        .find_slots(&request)
        .await
        .context("slot search failed")?;

    write!(
        writer,
        "{}",
        render::slots(&result, request.required.len(), request.duration_minutes)
    )?;

    if args.timeline {
        planner.highlight(&result, request.duration_minutes, &window);
        writeln!(writer)?;
        write!(
            writer,
            "{}",
            render::timeline(&planner.timeline(window), render::TIMELINE_WIDTH)
        )?;
    }
    Ok(())
}

/// Applies the selection and blackouts from `args` and builds the request.
fn prepare_request(
    planner: &mut PlannerState,
    args: &FindArgs,
    config: &Config,
) -> Result<MeetingRequest> {
    for (names, category) in [
        (&args.required, Category::Required),
        (&args.optional, Category::Optional),
    ] {
        for name in names {
            planner.selection.set(name, category, true)?;
        }
    }

    for blackout in &args.blackouts {
        planner
            .blackouts
            .add(*blackout)
            .with_context(|| format!("cannot block {blackout}"))?;
    }

    let options = MeetingOptions {
        duration_minutes: args.duration.unwrap_or(config.duration_minutes),
        buffer_minutes: args.buffer.unwrap_or(config.buffer_minutes),
        no_buffer: args.no_buffer,
    };
    tracing::debug!(?options, blackouts = args.blackouts.len(), "prepared slot search");
    Ok(MeetingRequest::build(
        &planner.selection,
        &options,
        &planner.blackouts,
    )?)
}
