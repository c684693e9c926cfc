use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use resilient_e2e::LatencyBudget;
use serde::Serialize;
use tracing::warn;

use super::context::CliContext;
use super::output::OutputFormat;

#[derive(Args, Clone, Debug)]
pub struct PlanArgs {
    /// Number of candidate locators per element
    #[arg(long, default_value_t = 1)]
    pub candidates: usize,

    /// Override the configured attempt count
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Override the configured initial delay, in ms
    #[arg(long)]
    pub initial_delay_ms: Option<u64>,

    /// Override the configured backoff multiplier
    #[arg(long)]
    pub multiplier: Option<f64>,

    /// Override the configured per-candidate timeout, in ms
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Compare against this flow deadline instead of the configured one, in ms
    #[arg(long)]
    pub deadline_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct PlanReport {
    #[serde(flatten)]
    budget: LatencyBudget,
    #[serde(skip_serializing_if = "Option::is_none")]
    deadline_ms: Option<u64>,
    exceeds_deadline: bool,
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.budget)?;
        if let Some(deadline_ms) = self.deadline_ms {
            let deadline = humantime::format_duration(Duration::from_millis(deadline_ms));
            if self.exceeds_deadline {
                write!(f, "\n  deadline:      {} (may be exceeded)", deadline)?;
            } else {
                write!(f, "\n  deadline:      {}", deadline)?;
            }
        }
        Ok(())
    }
}

pub async fn cmd_plan(args: PlanArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    if args.candidates == 0 {
        anyhow::bail!("--candidates must be at least 1");
    }

    let config = ctx.config();
    let mut policy = config.retry.labeled("plan");
    if let Some(max_attempts) = args.max_attempts {
        policy = policy.with_max_attempts(max_attempts);
    }
    if let Some(initial_delay_ms) = args.initial_delay_ms {
        policy = policy.with_initial_delay(Duration::from_millis(initial_delay_ms));
    }
    if let Some(multiplier) = args.multiplier {
        policy = policy.with_backoff_multiplier(multiplier);
    }
    policy.validate().context("Invalid retry settings")?;

    let mut options = config.locator;
    if let Some(timeout_ms) = args.timeout_ms {
        options = options.with_timeout(Duration::from_millis(timeout_ms));
    }

    let budget = LatencyBudget::for_lookup(&policy, &options, args.candidates);
    let deadline_ms = args.deadline_ms.or(config.flow.deadline_ms);
    let exceeds_deadline = deadline_ms
        .map(|ms| budget.exceeds(Duration::from_millis(ms)))
        .unwrap_or(false);
    if exceeds_deadline {
        warn!(
            "worst case of {}ms exceeds the {}ms flow deadline",
            budget.worst_case_ms,
            deadline_ms.unwrap_or_default()
        );
    }

    let report = PlanReport {
        budget,
        deadline_ms,
        exceeds_deadline,
    };
    println!("{}", output.render(&report)?);
    Ok(())
}
