//! Tracing subscriber setup shared by the binary and test suites.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{config::TelemetryConfig, errors::KitError};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over the configured level when set. `debug` forces the
/// `debug` level regardless of both.
pub fn init_tracing(config: &TelemetryConfig, debug: bool) -> Result<(), KitError> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&config.level)
                .map_err(|err| KitError::Telemetry(format!("invalid level: {err}")))?,
        }
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|err| KitError::Telemetry(err.to_string()))
}

/// Best-effort subscriber for tests; repeated calls are ignored.
pub fn init_for_tests() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_test_writer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_an_error() {
        init_for_tests();
        let err = init_tracing(&TelemetryConfig::default(), false).unwrap_err();
        assert!(matches!(err, KitError::Telemetry(_)));
    }
}
