use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration, overrides applied
    Show,

    /// Validate configuration
    Validate,

    /// Print the configuration file path
    Path,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let rendered = match output {
                OutputFormat::Json => serde_json::to_string_pretty(ctx.config())?,
                OutputFormat::Human | OutputFormat::Yaml => ctx.config().to_yaml()?,
            };
            if matches!(output, OutputFormat::Human) {
                match ctx.config_path() {
                    Some(path) if ctx.from_file() => {
                        println!("Current configuration ({}):", path.display())
                    }
                    _ => println!("Current configuration (defaults):"),
                }
            }
            println!("{}", rendered.trim_end());
        }
        ConfigAction::Validate => {
            ctx.config().validate()?;
            info!("Configuration validated");
            println!("Configuration is valid");
        }
        ConfigAction::Path => match ctx.config_path() {
            Some(path) => println!("{}", path.display()),
            None => println!("(no configuration directory available)"),
        },
    }
    Ok(())
}
