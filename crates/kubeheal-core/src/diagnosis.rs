//! Diagnosis records produced by root-cause analysis

use crate::failure::{FailureType, Severity};
use serde::{Deserialize, Serialize};

/// Upper bound of any confidence score
pub const MAX_CONFIDENCE: u8 = 100;

/// Rank of a suggested fix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FixPriority {
    /// Try first
    Primary,
    /// Try if the primary fix is not enough
    Secondary,
    /// Last resort or follow-up
    Tertiary,
}

/// Suggested fix for a diagnosed failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    /// Rank among the fixes for the same failure
    pub priority: FixPriority,
    /// Machine-readable action name
    pub action: String,
    /// Human-readable description
    pub description: String,
}

impl SuggestedFix {
    /// Create new suggested fix
    #[inline]
    #[must_use]
    pub fn new(
        priority: FixPriority,
        action: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            priority,
            action: action.into(),
            description: description.into(),
        }
    }
}

/// Scored root-cause diagnosis for one failure
///
/// Built once per analysis and never mutated afterwards; fields are public
/// for reading but the result is handed out by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    /// Diagnosed failure type
    pub failure_type: FailureType,
    /// Canonical cause for the failure type
    pub root_cause: String,
    /// Confidence in the diagnosis, 0-100
    pub confidence: u8,
    /// Matched indicators and descriptor observations, in order
    pub evidence: Vec<String>,
    /// Ordered fix suggestions
    pub suggested_fixes: Vec<SuggestedFix>,
    /// Severity of the failure pattern
    pub severity: Severity,
}

impl DiagnosisResult {
    /// Baseline diagnosis for a failure type with no supporting evidence
    #[must_use]
    pub fn baseline(failure_type: FailureType) -> Self {
        Self {
            failure_type,
            root_cause: "Unknown cause".to_string(),
            confidence: 50,
            evidence: Vec::new(),
            suggested_fixes: Vec::new(),
            severity: Severity::Unknown,
        }
    }

    /// Primary suggested fix, if any
    #[inline]
    #[must_use]
    pub fn primary_fix(&self) -> Option<&SuggestedFix> {
        self.suggested_fixes
            .iter()
            .find(|f| f.priority == FixPriority::Primary)
    }
}
