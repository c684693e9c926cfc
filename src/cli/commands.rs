use clap::Subcommand;

use super::config::ConfigArgs;
use super::plan::PlanArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Inspect the effective configuration
    Config(ConfigArgs),

    /// Show the retry schedule and worst-case latency of a lookup
    Plan(PlanArgs),
}
