//! Failure classification vocabulary
//!
//! Defines the closed set of workload failure types, their severities and
//! the healing strategy bound to each type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workload failure types recognised by the engine
///
/// Declaration order matters: it is the tie-break order when two types
/// score equally during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FailureType {
    /// Container killed for exceeding its memory limit
    #[serde(rename = "OOMKilled")]
    OomKilled,
    /// Container restarts repeatedly right after start
    CrashLoopBackOff,
    /// Image cannot be pulled from the registry
    ImagePullBackOff,
    /// Pod cannot be scheduled
    Pending,
    /// Liveness/readiness probes fail
    ProbeFailure,
    /// Hosting node is not ready
    NodeNotReady,
    /// Nothing matched
    Unknown,
}

impl FailureType {
    /// All classifiable types in declaration order (excludes `Unknown`)
    pub const ALL: [FailureType; 6] = [
        FailureType::OomKilled,
        FailureType::CrashLoopBackOff,
        FailureType::ImagePullBackOff,
        FailureType::Pending,
        FailureType::ProbeFailure,
        FailureType::NodeNotReady,
    ];

    /// Canonical name as reported by the cluster
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::OomKilled => "OOMKilled",
            FailureType::CrashLoopBackOff => "CrashLoopBackOff",
            FailureType::ImagePullBackOff => "ImagePullBackOff",
            FailureType::Pending => "Pending",
            FailureType::ProbeFailure => "ProbeFailure",
            FailureType::NodeNotReady => "NodeNotReady",
            FailureType::Unknown => "Unknown",
        }
    }

    /// Check if this is the no-match fallback
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, FailureType::Unknown)
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no failure type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFailureName(pub String);

impl fmt::Display for UnknownFailureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown failure type: '{}'", self.0)
    }
}

impl std::error::Error for UnknownFailureName {}

impl FromStr for FailureType {
    type Err = UnknownFailureName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FailureType::ALL
            .iter()
            .chain(std::iter::once(&FailureType::Unknown))
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| UnknownFailureName(s.to_string()))
    }
}

/// Severity of a failure, also used as the risk level of a remediation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Workload is fully down
    Critical,
    /// Workload is degraded
    High,
    /// Partial impact
    Medium,
    /// Cosmetic
    Low,
    /// No pattern known for the failure
    Unknown,
}

impl Severity {
    /// Uppercase label
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
            Severity::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of the structural edit bound to a failure type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealingStrategy {
    /// Double memory requests and mirror into limits
    IncreaseMemory,
    /// Push probe delays out and add a startup probe
    IncreaseStartupTime,
    /// Replace or pin the container image
    FixImageReference,
    /// Halve resource requests down to a floor
    ReduceRequests,
    /// Relax probe delays, timeouts and periods
    AdjustProbes,
    /// Identity; no edit is known for the failure
    NoOp,
}

impl HealingStrategy {
    /// Fixed lookup from failure type to strategy
    #[must_use]
    pub fn for_failure(failure_type: FailureType) -> Self {
        match failure_type {
            FailureType::OomKilled => HealingStrategy::IncreaseMemory,
            FailureType::CrashLoopBackOff => HealingStrategy::IncreaseStartupTime,
            FailureType::ImagePullBackOff => HealingStrategy::FixImageReference,
            FailureType::Pending => HealingStrategy::ReduceRequests,
            FailureType::ProbeFailure => HealingStrategy::AdjustProbes,
            FailureType::NodeNotReady | FailureType::Unknown => HealingStrategy::NoOp,
        }
    }

    /// Strategy identifier as logged
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HealingStrategy::IncreaseMemory => "increase_memory",
            HealingStrategy::IncreaseStartupTime => "increase_startup_time",
            HealingStrategy::FixImageReference => "fix_image_reference",
            HealingStrategy::ReduceRequests => "reduce_requests",
            HealingStrategy::AdjustProbes => "adjust_probes",
            HealingStrategy::NoOp => "none",
        }
    }
}

impl fmt::Display for HealingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_type_display_uses_canonical_name() {
        assert_eq!(FailureType::OomKilled.to_string(), "OOMKilled");
        assert_eq!(FailureType::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn failure_type_from_str_ignores_case() {
        assert_eq!("oomkilled".parse::<FailureType>(), Ok(FailureType::OomKilled));
        assert_eq!("Pending".parse::<FailureType>(), Ok(FailureType::Pending));
        assert!("Exploded".parse::<FailureType>().is_err());
    }

    #[test]
    fn failure_type_serializes_canonical_name() {
        let json = serde_json::to_string(&FailureType::OomKilled).unwrap();
        assert_eq!(json, "\"OOMKilled\"");
    }

    #[test]
    fn severity_labels() {
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
        assert_eq!(Severity::Unknown.to_string(), "UNKNOWN");
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"MEDIUM\"");
    }

    #[test]
    fn unmapped_types_use_noop() {
        assert_eq!(HealingStrategy::for_failure(FailureType::NodeNotReady), HealingStrategy::NoOp);
        assert_eq!(HealingStrategy::for_failure(FailureType::Unknown), HealingStrategy::NoOp);
        assert_eq!(
            HealingStrategy::for_failure(FailureType::OomKilled),
            HealingStrategy::IncreaseMemory
        );
    }

    #[test]
    fn all_excludes_unknown() {
        assert!(!FailureType::ALL.contains(&FailureType::Unknown));
        assert_eq!(FailureType::ALL[0], FailureType::OomKilled);
    }
}
