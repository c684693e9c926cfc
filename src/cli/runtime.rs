use std::path::Path;

use anyhow::{Context, Result};
use resilient_e2e::{telemetry, LoadedConfig, TelemetryConfig};

pub fn init_logging(config: &TelemetryConfig, level: Option<&str>, debug: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(level) = level {
        config.level = level.to_string();
    }
    telemetry::init_tracing(&config, debug).context("Failed to initialise logging")
}

pub async fn load_config(config_path: Option<&Path>) -> Result<LoadedConfig> {
    resilient_e2e::load_config(config_path)
        .await
        .context("Failed to load configuration")
}
