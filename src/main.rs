//! Convoscope - conversation session reconstruction CLI
//!
#![doc = "Convoscope - conversation session reconstruction CLI"]
#![doc = "Main entry point for the Convoscope application."]

use anyhow::Result;

use convoscope::cli::{Cli, Commands};
use convoscope::commands;
use convoscope::config::Config;
use convoscope::logging::{bootstrap_subscriber, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration; logging depends on it, so startup warnings go
    // through a temporary stderr subscriber
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = tracing::subscriber::with_default(bootstrap_subscriber(), || {
        Config::load(config_path, &cli)
    })?;

    init_logging(&config.logging)?;
    tracing::debug!("Configuration loaded from {}", config_path);

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Summarize { report } => {
            tracing::info!("Starting session summary");
            if let Some(input) = &report.input {
                tracing::debug!("Reading messages from export: {}", input.display());
            }
            commands::summarize::run_summarize(config, report).await?;
            Ok(())
        }
        Commands::Room { target, report } => {
            tracing::info!("Starting single room summary");
            commands::room::run_room(config, target, report).await?;
            Ok(())
        }
    }
}
