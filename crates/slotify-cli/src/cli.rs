//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::clear::ClearArgs;
use crate::commands::find::FindArgs;
use crate::commands::upload::UploadArgs;

/// Meeting slot planner.
///
/// Uploads calendar exports to a slotify server, shows when participants
/// are busy, and searches for slots where every required participant is
/// free.
#[derive(Debug, Parser)]
#[command(name = "slotify", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show loaded participants and their busy times.
    Status,

    /// Upload a calendar export and follow its progress.
    Upload(UploadArgs),

    /// Delete the calendar data held by the server.
    Clear(ClearArgs),

    /// Search for meeting slots.
    Find(FindArgs),
}
