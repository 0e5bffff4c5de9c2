//! Clear command for deleting server-held calendar data.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;

use slotify_client::Client;

#[derive(Debug, Args)]
pub struct ClearArgs {
    /// Confirm deleting all uploaded calendar data.
    #[arg(long)]
    pub yes: bool,
}

pub async fn run<W: Write>(writer: &mut W, client: &Client, args: &ClearArgs) -> Result<()> {
    if !args.yes {
        bail!("refusing to clear calendar data without --yes");
    }

    client
        .clear_state()
        .await
        .context("failed to clear calendar data")?;
    writeln!(writer, "Cleared calendar data.")?;
    Ok(())
}
