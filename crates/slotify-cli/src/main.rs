use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use slotify_cli::commands::{clear, find, status, upload};
use slotify_cli::{Cli, Commands, Config};
use slotify_client::Client;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    let window = config
        .display_window()
        .context("invalid display window in configuration")?;
    let client = Client::new(config.server_url.as_str(), config.request_timeout())
        .context("failed to create server client")?;

    // One thread drives every upload, frame and state change in order.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize tokio runtime")?;

    let mut stdout = std::io::stdout().lock();
    runtime.block_on(async {
        match command {
            Commands::Status => status::run(&mut stdout, &client, window).await,
            Commands::Upload(args) => upload::run(&mut stdout, &client, args, window).await,
            Commands::Clear(args) => clear::run(&mut stdout, &client, args).await,
            Commands::Find(args) => find::run(&mut stdout, &client, args, &config, window).await,
        }
    })
}
