use anyhow::Result;

use super::config::cmd_config;
use super::env::CliArgs;
use super::plan::cmd_plan;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Config(args) => cmd_config(args, ctx, cli.output).await,
        Commands::Plan(args) => cmd_plan(args, ctx, cli.output).await,
    }
}
