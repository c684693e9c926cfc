//! Error handling module
//!
//! Failures of the kit itself: configuration, telemetry setup and flow
//! guards. Action failures stay typed in [`crate::page::PageError`].

use std::path::PathBuf;

use e2e_core_types::FlowId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KitError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: String, value: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to initialise tracing: {0}")]
    Telemetry(String),

    #[error("flow {flow} exceeded its {deadline_ms}ms deadline")]
    DeadlineExceeded { flow: FlowId, deadline_ms: u64 },

    #[error("flow {0} was cancelled")]
    Cancelled(FlowId),
}

impl KitError {
    /// True for the two ways a flow guard stops work early.
    pub fn is_interruption(&self) -> bool {
        matches!(
            self,
            KitError::DeadlineExceeded { .. } | KitError::Cancelled(_)
        )
    }
}
