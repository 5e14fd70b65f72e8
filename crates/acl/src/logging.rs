//! Logging initialization
//!
//! Installs a global `tracing` subscriber built from [`LogConfig`]: an
//! [`EnvFilter`] from `level` and a `fmt` layer in the configured format.
//! Library code only emits events; calling [`init`] is up to the binary.

use crate::config::{Format, LogConfig};
use crate::core::ConfigError;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber
///
/// # Errors
///
/// - `InvalidValue` if `level` is not a valid filter
/// - `InvalidValue` if a global subscriber is already installed
pub fn init(config: &LogConfig) -> Result<(), ConfigError> {
    let filter = make_filter(&config.level)?;
    let registry = Registry::default().with(filter);

    let result = match config.format {
        Format::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
            .try_init(),
        Format::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .try_init(),
        Format::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init(),
    };

    result.map_err(|e| ConfigError::InvalidValue {
        field: "log".into(),
        reason: e.to_string(),
    })
}

fn make_filter(level: &str) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(level).map_err(|e| ConfigError::InvalidValue {
        field: "log.level".into(),
        reason: e.to_string(),
    })
}
