//! Configuration management module
//!
//! One YAML document configures the retry policy, resolver options, flow
//! guard and logging. Missing keys fall back to defaults and
//! `RESILIENT_E2E_*` environment variables override the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use action_locator::ResolveOptions;
use action_retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::errors::KitError;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "RESILIENT_E2E_";

const LOCAL_CONFIG: &str = "config/resilient-e2e.yaml";
const APP_DIR: &str = "resilient-e2e";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KitConfig {
    /// Default policy for page actions; labels are replaced per action
    pub retry: RetryPolicy,

    /// Default resolver options for page lookups
    pub locator: ResolveOptions,

    pub flow: FlowConfig,

    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Wall-clock limit for a whole flow, measured from its creation
    pub deadline_ms: Option<u64>,
}

impl FlowConfig {
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, e.g. `info` or `action_retry=debug,info`
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Log every resolver and retry event from page actions
    pub events: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            events: false,
        }
    }
}

/// Configuration plus where it came from.
#[derive(Clone, Debug)]
pub struct LoadedConfig {
    pub config: KitConfig,

    /// Path that was consulted, whether or not it existed
    pub path: Option<PathBuf>,

    pub from_file: bool,
}

impl LoadedConfig {
    /// Log where the configuration came from.
    ///
    /// Loading runs before the subscriber exists, so callers invoke this once
    /// logging is installed.
    pub fn log_origin(&self) {
        match &self.path {
            Some(path) if self.from_file => {
                info!("Loaded configuration from: {}", path.display())
            }
            Some(path) => warn!("Config file not found, using defaults: {}", path.display()),
            None => warn!("No config directory available, using defaults"),
        }
        debug!(config = ?self.config, "effective configuration");
    }
}

impl KitConfig {
    pub fn from_yaml_str(source: &str, path: &Path) -> Result<Self, KitError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source).map_err(|source| KitError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_yaml(&self) -> Result<String, KitError> {
        serde_yaml::to_string(self).map_err(|err| KitError::InvalidConfig(err.to_string()))
    }

    /// Apply `RESILIENT_E2E_*` variables from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), KitError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by full variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), KitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| {
            let key = format!("{ENV_PREFIX}{suffix}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((key, value)) = var("MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_var(&key, &value)?;
        }
        if let Some((key, value)) = var("INITIAL_DELAY_MS") {
            self.retry.initial_delay_ms = parse_var(&key, &value)?;
        }
        if let Some((key, value)) = var("BACKOFF_MULTIPLIER") {
            self.retry.backoff_multiplier = parse_var(&key, &value)?;
        }
        if let Some((key, value)) = var("MAX_DELAY_MS") {
            self.retry.max_delay_ms = parse_optional_ms(&key, &value)?;
        }
        if let Some((key, value)) = var("JITTER") {
            self.retry.jitter = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("CANDIDATE_TIMEOUT_MS") {
            self.locator.per_candidate_timeout =
                Duration::from_millis(parse_var(&key, &value)?);
        }
        if let Some((key, value)) = var("REQUIRE_VISIBLE") {
            self.locator.require_visible = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("DEADLINE_MS") {
            self.flow.deadline_ms = parse_optional_ms(&key, &value)?;
        }
        if let Some((_, value)) = var("LOG_LEVEL") {
            self.telemetry.level = value;
        }
        if let Some((key, value)) = var("LOG_JSON") {
            self.telemetry.json = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = var("LOG_EVENTS") {
            self.telemetry.events = parse_bool(&key, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), KitError> {
        self.retry
            .validate()
            .map_err(|err| KitError::InvalidConfig(format!("retry: {err}")))?;

        if self.locator.per_candidate_timeout.is_zero() {
            return Err(KitError::InvalidConfig(
                "locator: per_candidate_timeout_ms must be positive".into(),
            ));
        }
        if self.flow.deadline_ms == Some(0) {
            return Err(KitError::InvalidConfig(
                "flow: deadline_ms must be positive when set".into(),
            ));
        }
        EnvFilter::try_new(&self.telemetry.level).map_err(|err| {
            KitError::InvalidConfig(format!(
                "telemetry: invalid level '{}': {err}",
                self.telemetry.level
            ))
        })?;
        Ok(())
    }
}

/// Local `config/resilient-e2e.yaml` if present, else the user config dir.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir().map(|mut path| {
        path.push(APP_DIR);
        path.push("config.yaml");
        path
    })
}

/// Read, override and validate the configuration.
///
/// A missing file is not an error: defaults are used and `from_file` is
/// false. Nothing is logged here; see [`LoadedConfig::log_origin`].
pub async fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, KitError> {
    let path = explicit.map(Path::to_path_buf).or_else(default_config_path);

    let (mut config, from_file) = match &path {
        Some(path) if path.exists() => {
            let content = fs::read_to_string(path)
                .await
                .map_err(|source| KitError::ConfigRead {
                    path: path.clone(),
                    source,
                })?;
            (KitConfig::from_yaml_str(&content, path)?, true)
        }
        _ => (KitConfig::default(), false),
    };

    config.apply_env_overrides()?;
    config.validate()?;

    Ok(LoadedConfig {
        config,
        path,
        from_file,
    })
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T, KitError> {
    value.trim().parse().map_err(|_| KitError::InvalidEnv {
        var: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, KitError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(KitError::InvalidEnv {
            var: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// `none`/`off`/empty clear the setting.
fn parse_optional_ms(key: &str, value: &str) -> Result<Option<u64>, KitError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "none" | "off" => Ok(None),
        _ => parse_var(key, value).map(Some),
    }
}
