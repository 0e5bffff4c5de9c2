//! Upload command for sending a calendar export to the server.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tokio_util::sync::CancellationToken;

use slotify_client::Client;
use slotify_core::{DisplayWindow, PlannerState, UploadFile};

use super::status;

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Calendar export to upload.
    pub file: Option<PathBuf>,
}

pub async fn run<W: Write>(
    writer: &mut W,
    client: &Client,
    args: &UploadArgs,
    window: DisplayWindow,
) -> Result<()> {
    let file = match &args.file {
        Some(path) => Some(read_upload(path).await?),
        None => None,
    };

    let cancel = CancellationToken::new();
    let interrupt = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("interrupt received, cancelling upload");
                cancel.cancel();
            }
        }
    });

    let mut planner = PlannerState::new();
    let lifecycle = client
        .upload(file, &mut planner.trigger, &cancel, |message| {
            eprintln!("{message}");
        })
        .await;
    interrupt.abort();

    let snapshot = lifecycle.into_outcome()?;
    planner.adopt(snapshot);
    status::write_state(writer, &planner, window)
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "calendar".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(UploadFile { file_name, content })
}
