//! Remediation records
//!
//! A [`RemediationAction`] is created once per healing cycle and appended to
//! the engine's audit trail. It lists every [`Modification`] applied to the
//! descriptor and every [`SkippedField`] the strategy could not interpret.

use crate::diagnosis::DiagnosisResult;
use crate::failure::{FailureType, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique remediation action identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Ulid);

impl ActionId {
    /// Generate new action ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One field-level edit applied to a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    /// Full dotted path of the edited field
    pub field: String,
    /// Value before the edit
    pub old_value: String,
    /// Value after the edit
    pub new_value: String,
    /// Name of the container the field belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

impl Modification {
    /// Create new modification
    #[inline]
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value: old_value.into(),
            new_value: new_value.into(),
            container_name: None,
        }
    }

    /// With container name
    #[inline]
    #[must_use]
    pub fn in_container(mut self, name: Option<String>) -> Self {
        self.container_name = name;
        self
    }
}

/// Field a strategy wanted to edit but left alone because its value did not parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedField {
    /// Full dotted path of the field
    pub field: String,
    /// Value as found
    pub value: String,
    /// Why it was skipped
    pub reason: String,
    /// Name of the container the field belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
}

impl SkippedField {
    /// Create new skipped-field marker
    #[inline]
    #[must_use]
    pub fn new(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            container_name: None,
        }
    }

    /// With container name
    #[inline]
    #[must_use]
    pub fn in_container(mut self, name: Option<String>) -> Self {
        self.container_name = name;
        self
    }
}

/// Record of one healing cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationAction {
    /// Action identifier
    pub id: ActionId,
    /// When the action was taken
    pub timestamp: DateTime<Utc>,
    /// Primary failure type the cycle remediated
    pub failure_type: FailureType,
    /// Root cause from the diagnosis
    pub root_cause: String,
    /// Diagnosis confidence, 0-100
    pub confidence: u8,
    /// Applied edits, in order
    pub modifications: Vec<Modification>,
    /// Fields left untouched because their values did not parse
    #[serde(default)]
    pub skipped: Vec<SkippedField>,
    /// Why this remediation was applied
    pub rationale: String,
    /// Risk of the remediation (the diagnosed severity)
    pub risk_level: Severity,
}

impl RemediationAction {
    /// Build the action for a finished healing cycle
    #[must_use]
    pub fn from_diagnosis(
        diagnosis: &DiagnosisResult,
        modifications: Vec<Modification>,
        skipped: Vec<SkippedField>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            timestamp: Utc::now(),
            failure_type: diagnosis.failure_type,
            root_cause: diagnosis.root_cause.clone(),
            confidence: diagnosis.confidence,
            modifications,
            skipped,
            rationale: format!(
                "Applied {} remediation with {}% confidence",
                diagnosis.failure_type, diagnosis.confidence
            ),
            risk_level: diagnosis.severity,
        }
    }

    /// Check whether the cycle changed the descriptor
    #[inline]
    #[must_use]
    pub fn changed_descriptor(&self) -> bool {
        !self.modifications.is_empty()
    }
}
