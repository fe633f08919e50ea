//! Plugin Updater CLI
//!
//! A command-line tool that keeps server plugin jars up to date and rolls
//! back installs that break the host server.

use clap::Parser;
use plugin_updater::cli::{
    args::{Cli, Commands},
    commands::{list, pending, update, watch},
};
use plugin_updater::models::config;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = Arc::new(config::load_config());

    // Run the appropriate command
    match cli.command {
        Commands::Update { name } => {
            update::update(config, name).await?;
        }

        Commands::List => {
            list::list(&config)?;
        }

        Commands::Add { name, locator } => {
            list::add(&config, &name, &locator)?;
        }

        Commands::Remove { name } => {
            list::remove(&config, &name)?;
        }

        Commands::Enable { name } => {
            list::set_enabled(&config, &name, true)?;
        }

        Commands::Disable { name } => {
            list::set_enabled(&config, &name, false)?;
        }

        Commands::Pending { action } => {
            pending::pending(config, action).await?;
        }

        Commands::Watch { log_file } => {
            watch::watch(config, log_file.as_deref()).await?;
        }
    }

    Ok(())
}

/// Initialize the logging system.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("plugin_updater=debug")
    } else {
        EnvFilter::new("plugin_updater=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
