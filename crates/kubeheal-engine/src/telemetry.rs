//! Tracing initialisation for drivers
//!
//! The engine only emits `tracing` events. A driver that wants them on
//! stderr calls [`init_tracing`] once at startup; `RUST_LOG` overrides the
//! configured level.

use crate::error::TelemetryError;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration for tracing initialisation
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_format: bool,
    /// Include the event target
    pub with_target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            json_format: false,
            with_target: true,
        }
    }
}

impl TracingConfig {
    /// With default level
    #[inline]
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    /// With JSON output
    #[inline]
    #[must_use]
    pub fn json(mut self) -> Self {
        self.json_format = true;
        self
    }
}

/// Install the global subscriber
///
/// Safe to call more than once; later calls return an error instead of
/// panicking.
///
/// # Errors
/// Returns [`TelemetryError::Init`] when the level does not parse or a
/// global subscriber is already set.
pub fn init_tracing(config: &TracingConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_level)
            .map_err(|e| TelemetryError::Init(e.to_string()))?,
    };

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let result = if config.json_format {
        subscriber
            .with(fmt::layer().json().with_target(config.with_target))
            .try_init()
    } else {
        subscriber
            .with(fmt::layer().with_target(config.with_target))
            .try_init()
    };

    result.map_err(|e| TelemetryError::Init(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        let config = TracingConfig::default().with_level("debug");
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }

    #[test]
    fn json_config() {
        let config = TracingConfig::default().json();
        assert!(config.json_format);
        assert_eq!(config.default_level, "info");
    }
}
