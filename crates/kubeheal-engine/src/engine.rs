//! Self-healing engine
//!
//! One healing cycle: parse → detect → analyze → heal → audit.

use crate::audit::AuditTrail;
use crate::config::EngineConfig;
use crate::error::EngineError;
use kubeheal_core::{FailureType, RemediationAction};
use kubeheal_diagnosis::{FailureDetector, PatternLibrary, RootCauseAnalyzer};
use kubeheal_manifest::{heal, Descriptor, HealOptions};
use std::sync::Arc;

/// Diagnoses failures and heals descriptors, keeping an audit trail
#[derive(Debug)]
pub struct SelfHealingEngine {
    detector: FailureDetector,
    analyzer: RootCauseAnalyzer,
    config: EngineConfig,
    audit: AuditTrail,
}

impl Default for SelfHealingEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SelfHealingEngine {
    /// Create engine over the standard pattern library
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_library(config, PatternLibrary::standard())
    }

    /// Create engine over a custom pattern library
    #[must_use]
    pub fn with_library(config: EngineConfig, library: Arc<PatternLibrary>) -> Self {
        Self {
            detector: FailureDetector::new(Arc::clone(&library)),
            analyzer: RootCauseAnalyzer::new(library),
            config,
            audit: AuditTrail::new(),
        }
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one healing cycle with the configured heal options
    ///
    /// # Errors
    /// Returns [`EngineError::Parse`] when `descriptor_text` is not a valid
    /// document. Healing failures are not errors: they leave the descriptor
    /// unchanged.
    pub fn diagnose_and_heal(
        &self,
        log_text: &str,
        descriptor_text: &str,
        status_text: Option<&str>,
    ) -> Result<(String, RemediationAction), EngineError> {
        let options = self.config.heal_options();
        self.diagnose_and_heal_with(log_text, descriptor_text, status_text, &options)
    }

    /// Run one healing cycle with explicit heal options
    ///
    /// Returns the healed descriptor text and the recorded action. The text
    /// is the original verbatim when nothing was modified.
    ///
    /// # Errors
    /// Returns [`EngineError::Parse`] when `descriptor_text` is not a valid
    /// document.
    pub fn diagnose_and_heal_with(
        &self,
        log_text: &str,
        descriptor_text: &str,
        status_text: Option<&str>,
        options: &HealOptions,
    ) -> Result<(String, RemediationAction), EngineError> {
        let descriptor = Descriptor::parse(descriptor_text).map_err(|error| {
            tracing::error!(%error, "cannot parse descriptor");
            error
        })?;

        let ranked = self.detector.detect(log_text, status_text);
        let primary = ranked.first().copied().unwrap_or(FailureType::Unknown);
        tracing::info!(failure_type = %primary, candidates = ?ranked, "detected failure");

        let diagnosis = self
            .analyzer
            .analyze_descriptor(primary, log_text, Some(&descriptor));

        let (healed, modifications, skipped) = match heal(primary, &descriptor, &diagnosis, options) {
            Ok(outcome) if outcome.modifications.is_empty() => {
                (descriptor_text.to_string(), Vec::new(), outcome.skipped)
            }
            Ok(outcome) => match outcome.descriptor.to_yaml() {
                Ok(text) => (text, outcome.modifications, outcome.skipped),
                Err(error) => {
                    tracing::error!(%error, failure_type = %primary, "cannot serialize healed descriptor, keeping original");
                    (descriptor_text.to_string(), Vec::new(), outcome.skipped)
                }
            },
            Err(error) => {
                tracing::error!(%error, failure_type = %primary, "healing failed, keeping original descriptor");
                (descriptor_text.to_string(), Vec::new(), Vec::new())
            }
        };

        let action = RemediationAction::from_diagnosis(&diagnosis, modifications, skipped);
        self.audit.append(action.clone());

        tracing::info!(
            action_id = %action.id,
            failure_type = %action.failure_type,
            modifications = action.modifications.len(),
            skipped = action.skipped.len(),
            risk = %action.risk_level,
            "remediation recorded"
        );

        Ok((healed, action))
    }

    /// Snapshot of every recorded action, oldest first
    #[must_use]
    pub fn audit_trail(&self) -> Vec<RemediationAction> {
        self.audit.actions()
    }

    /// Hash-chained audit trail, for verification and export
    #[inline]
    #[must_use]
    pub fn audit(&self) -> &AuditTrail {
        &self.audit
    }
}
