//! Engine configuration

use crate::error::ConfigError;
use kubeheal_manifest::HealOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Engine and retry-loop configuration
///
/// Missing TOML keys fall back to the defaults.
///
/// ```
/// use kubeheal_engine::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("max_retries = 5").unwrap();
/// assert_eq!(config.max_retries, 5);
/// assert_eq!(config.backoff_cap_secs, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Deploy attempts before the workflow aborts
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds
    pub backoff_base: u64,
    /// Upper bound on a single backoff, in seconds
    pub backoff_cap_secs: u64,
    /// Replacement image offered to the image-pull strategy
    pub suggested_image: Option<String>,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate configuration from TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError`] when the text does not deserialize or a value
    /// is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns [`ConfigError::OutOfRange`] for the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries < 1 {
            return Err(ConfigError::OutOfRange {
                field: "max_retries",
                reason: "must be at least 1",
            });
        }
        if self.backoff_base < 1 {
            return Err(ConfigError::OutOfRange {
                field: "backoff_base",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// With max retries
    #[inline]
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// With backoff base
    #[inline]
    #[must_use]
    pub fn with_backoff_base(mut self, base: u64) -> Self {
        self.backoff_base = base;
        self
    }

    /// With backoff cap
    #[inline]
    #[must_use]
    pub fn with_backoff_cap_secs(mut self, cap: u64) -> Self {
        self.backoff_cap_secs = cap;
        self
    }

    /// With suggested image
    #[inline]
    #[must_use]
    pub fn with_suggested_image(mut self, image: impl Into<String>) -> Self {
        self.suggested_image = Some(image.into());
        self
    }

    /// Delay before the retry that follows `attempt`: `min(base^attempt, cap)` seconds
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let secs = self
            .backoff_base
            .checked_pow(attempt)
            .unwrap_or(u64::MAX)
            .min(self.backoff_cap_secs);
        Duration::from_secs(secs)
    }

    /// Heal options derived from this configuration
    #[must_use]
    pub fn heal_options(&self) -> HealOptions {
        match self.suggested_image.as_deref() {
            Some(image) => HealOptions::default().with_suggested_image(image),
            None => HealOptions::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base: 2,
            backoff_cap_secs: 8,
            suggested_image: None,
        }
    }
}
