use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use super::context::CliContext;
use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::{init_logging, load_config};

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    // Logging settings live in the config file, so it is read first.
    let loaded = load_config(cli.config.as_deref()).await?;
    init_logging(&loaded.config.telemetry, cli.log_level.as_deref(), cli.debug)?;

    info!("Starting resilient-e2e v{}", env!("CARGO_PKG_VERSION"));
    loaded.log_origin();

    let ctx = CliContext::new(loaded);
    match dispatch(&cli, &ctx).await {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(err) => {
            error!("Command failed: {}", err);
            Err(err)
        }
    }
}
