//! Failure pattern library
//!
//! Immutable tables mapping each failure type to its detection signatures
//! and to its root-cause indicator rules. The standard library is compiled
//! once per process and shared through [`Arc`]; custom libraries go through
//! [`PatternLibraryBuilder`].
//!
//! A rule whose regex fails to compile is dropped with a warning and kept
//! in [`PatternLibrary::rejected`]; the rest of the library still builds.

use crate::error::PatternError;
use kubeheal_core::{FailureType, HealingStrategy, Severity};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Detection signatures for one failure type
#[derive(Debug, Clone)]
pub struct FailurePattern {
    /// Failure type detected by these signatures
    pub failure_type: FailureType,
    /// Case-insensitive signatures, in order
    pub signatures: Vec<Regex>,
    /// Severity of the failure
    pub severity: Severity,
    /// Strategy used to heal it
    pub healing_strategy: HealingStrategy,
}

impl FailurePattern {
    /// Number of signatures matching `text`
    #[must_use]
    pub fn match_count(&self, text: &str) -> usize {
        self.signatures.iter().filter(|s| s.is_match(text)).count()
    }
}

/// Root-cause indicator
#[derive(Debug, Clone)]
pub struct Indicator {
    /// Short indicator name (`memory_limit_low`)
    pub name: String,
    /// Case-insensitive pattern
    pub regex: Regex,
    /// What a match suggests
    pub explanation: String,
}

/// Indicator rules and typical cause for one failure type
#[derive(Debug, Clone)]
pub struct DiagnosisRuleSet {
    /// Failure type the rules explain
    pub failure_type: FailureType,
    /// Indicators, in evaluation order
    pub indicators: Vec<Indicator>,
    /// Canonical cause reported for the type
    pub typical_cause: String,
}

/// Compiled pattern and rule tables
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<FailurePattern>,
    rules: Vec<DiagnosisRuleSet>,
    rejected: Vec<PatternError>,
}

impl PatternLibrary {
    /// Shared standard library
    #[must_use]
    pub fn standard() -> Arc<PatternLibrary> {
        Arc::clone(&STANDARD)
    }

    /// Start building a custom library
    #[inline]
    #[must_use]
    pub fn builder() -> PatternLibraryBuilder {
        PatternLibraryBuilder::default()
    }

    /// Patterns in failure-type declaration order
    #[inline]
    #[must_use]
    pub fn patterns(&self) -> &[FailurePattern] {
        &self.patterns
    }

    /// Pattern for a failure type
    #[must_use]
    pub fn pattern(&self, failure_type: FailureType) -> Option<&FailurePattern> {
        self.patterns.iter().find(|p| p.failure_type == failure_type)
    }

    /// Rule set for a failure type
    #[must_use]
    pub fn rules(&self, failure_type: FailureType) -> Option<&DiagnosisRuleSet> {
        self.rules.iter().find(|r| r.failure_type == failure_type)
    }

    /// Severity of a failure type, `Unknown` when no pattern exists
    #[must_use]
    pub fn severity(&self, failure_type: FailureType) -> Severity {
        self.pattern(failure_type)
            .map_or(Severity::Unknown, |p| p.severity)
    }

    /// Rules dropped because their regex did not compile
    #[inline]
    #[must_use]
    pub fn rejected(&self) -> &[PatternError] {
        &self.rejected
    }
}

/// Builder for [`PatternLibrary`]
#[derive(Debug, Default)]
pub struct PatternLibraryBuilder {
    library: PatternLibrary,
}

impl PatternLibraryBuilder {
    /// Add detection signatures for a failure type
    #[must_use]
    pub fn pattern(mut self, failure_type: FailureType, severity: Severity, signatures: &[&str]) -> Self {
        let signatures = signatures
            .iter()
            .enumerate()
            .filter_map(|(i, s)| self.compile(failure_type, &format!("signature {i}"), s))
            .collect();
        self.library.patterns.retain(|p| p.failure_type != failure_type);
        self.library.patterns.push(FailurePattern {
            failure_type,
            signatures,
            severity,
            healing_strategy: HealingStrategy::for_failure(failure_type),
        });
        self
    }

    /// Add indicator rules for a failure type
    ///
    /// Each indicator is `(name, pattern, explanation)`.
    #[must_use]
    pub fn rules(
        mut self,
        failure_type: FailureType,
        typical_cause: &str,
        indicators: &[(&str, &str, &str)],
    ) -> Self {
        let indicators = indicators
            .iter()
            .filter_map(|(name, pattern, explanation)| {
                self.compile(failure_type, name, pattern).map(|regex| Indicator {
                    name: (*name).to_string(),
                    regex,
                    explanation: (*explanation).to_string(),
                })
            })
            .collect();
        self.library.rules.retain(|r| r.failure_type != failure_type);
        self.library.rules.push(DiagnosisRuleSet {
            failure_type,
            indicators,
            typical_cause: typical_cause.to_string(),
        });
        self
    }

    /// Finish; patterns are ordered by failure-type declaration order
    #[must_use]
    pub fn build(mut self) -> PatternLibrary {
        self.library.patterns.sort_by_key(|p| p.failure_type);
        self.library.rules.sort_by_key(|r| r.failure_type);
        self.library
    }

    fn compile(&mut self, failure_type: FailureType, rule: &str, pattern: &str) -> Option<Regex> {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(regex) => Some(regex),
            Err(e) => {
                let error = PatternError::InvalidRegex {
                    failure_type,
                    rule: rule.to_string(),
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                };
                tracing::warn!(%error, "dropping pattern rule");
                self.library.rejected.push(error);
                None
            }
        }
    }
}

static STANDARD: Lazy<Arc<PatternLibrary>> = Lazy::new(|| Arc::new(standard_library()));

fn standard_library() -> PatternLibrary {
    PatternLibrary::builder()
        .pattern(
            FailureType::OomKilled,
            Severity::Critical,
            &[
                r"OOMKilled",
                r"OutOfMemory",
                r"Memory exhausted",
                r"Exit Code: 137",
                r"exit 137",
                r"Killed",
                r"exceeded memory limit",
            ],
        )
        .pattern(
            FailureType::CrashLoopBackOff,
            Severity::High,
            &[
                r"CrashLoopBackOff",
                r"Exit Code: [1-9]",
                r"exit [1-9]",
                r"exception",
                r"panic",
                r"fatal error",
                r"segmentation fault",
                r"core dumped",
                r"ERROR.*startup",
                r"application failed",
            ],
        )
        .pattern(
            FailureType::ImagePullBackOff,
            Severity::Critical,
            &[
                r"ImagePullBackOff",
                r"image not found",
                r"no such image",
                r"unauthorized",
                r"pull access denied",
                r"image pull error",
                r"failed to pull image",
                r"not found: manifest",
            ],
        )
        .pattern(
            FailureType::Pending,
            Severity::High,
            &[
                r"Pending",
                r"insufficient.*memory",
                r"insufficient.*cpu",
                r"no nodes available",
                r"node selector",
                r"taint.*toleration",
                r"PersistentVolumeClaim.*not bound",
            ],
        )
        .pattern(
            FailureType::ProbeFailure,
            Severity::Medium,
            &[
                r"readiness.*fail",
                r"liveness.*fail",
                r"health check.*fail",
                r"probe.*fail",
                r"connection refused",
                r"timeout waiting for probe",
                r"Unhealthy",
            ],
        )
        .pattern(
            FailureType::NodeNotReady,
            Severity::High,
            &[
                r"NodeNotReady",
                r"node.*not ready",
                r"kubelet stopped posting node status",
                r"node.*unreachable",
                r"NetworkUnavailable",
            ],
        )
        .rules(
            FailureType::OomKilled,
            "Container memory limit insufficient for application workload",
            &[
                ("memory_limit_low", r"memory: (\d+)Mi", "Check if limit is less than observed usage"),
                ("java_heap", r"java.*-Xmx", "Java heap size may be too small"),
                ("memory_leak", r"gradually.*memory", "Potential memory leak in application"),
                ("concurrent_load", r"concurrent|parallel", "High concurrency may increase memory usage"),
            ],
        )
        .rules(
            FailureType::CrashLoopBackOff,
            "Application crashes immediately on startup due to configuration, dependencies, or code issues",
            &[
                ("missing_env", r"[^_]ENV|environment.*not set", "Missing environment variables"),
                ("missing_file", r"no such file|file not found", "Missing config files or dependencies"),
                ("connection_error", r"connection.*refused|connection.*error", "Cannot connect to dependencies"),
                ("config_error", r"invalid.*config|config.*error", "Configuration error in application"),
                ("startup_error", r"failed to start|startup.*error", "Application startup failure"),
            ],
        )
        .rules(
            FailureType::ImagePullBackOff,
            "Container image unavailable or inaccessible from cluster",
            &[
                ("wrong_registry", r"registry|docker.io", "Check registry configuration"),
                ("wrong_tag", r":[a-z0-9.-]+", "Verify image tag exists"),
                ("private_registry", r"private|auth|credentials", "Private registry needs credentials"),
                ("typo", r"latest", "Consider using specific version instead of :latest"),
            ],
        )
        .rules(
            FailureType::Pending,
            "Insufficient cluster resources to schedule pod",
            &[
                ("high_memory", r"memory.*[0-9]+Gi", "Memory request very high"),
                ("high_cpu", r"cpu.*[0-9]+", "CPU request very high"),
                ("node_selector", r"nodeSelector|affinity", "Node selection criteria too restrictive"),
                ("pvc", r"PersistentVolumeClaim|storage", "Storage not available"),
            ],
        )
        .rules(
            FailureType::ProbeFailure,
            "Health check probe failing to receive expected response",
            &[
                ("app_not_ready", r"startup.*slow|initialization|loading", "Application needs more startup time"),
                ("endpoint_missing", r"404|not found", "Health check endpoint doesn't exist"),
                ("port_wrong", r"port|connection refused", "Wrong port number for health checks"),
                ("timeout", r"timeout", "Probe timeout too short for endpoint response"),
            ],
        )
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_library_compiles_everything() {
        let library = PatternLibrary::standard();
        assert!(library.rejected().is_empty());
        assert_eq!(library.patterns().len(), 6);
        assert_eq!(library.pattern(FailureType::OomKilled).unwrap().signatures.len(), 7);
        assert_eq!(library.pattern(FailureType::CrashLoopBackOff).unwrap().signatures.len(), 10);
    }

    #[test]
    fn standard_library_is_shared() {
        let a = PatternLibrary::standard();
        let b = PatternLibrary::standard();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn patterns_in_declaration_order() {
        let library = PatternLibrary::builder()
            .pattern(FailureType::Pending, Severity::High, &["pending"])
            .pattern(FailureType::OomKilled, Severity::Critical, &["oom"])
            .build();
        let order: Vec<_> = library.patterns().iter().map(|p| p.failure_type).collect();
        assert_eq!(order, vec![FailureType::OomKilled, FailureType::Pending]);
    }

    #[test]
    fn severity_lookup() {
        let library = PatternLibrary::standard();
        assert_eq!(library.severity(FailureType::OomKilled), Severity::Critical);
        assert_eq!(library.severity(FailureType::ProbeFailure), Severity::Medium);
        assert_eq!(library.severity(FailureType::Unknown), Severity::Unknown);
    }

    #[test]
    fn node_not_ready_has_no_rules() {
        let library = PatternLibrary::standard();
        assert!(library.rules(FailureType::NodeNotReady).is_none());
        assert!(library.rules(FailureType::Unknown).is_none());
        assert_eq!(library.rules(FailureType::Pending).unwrap().indicators.len(), 4);
    }

    #[test]
    fn malformed_rule_is_dropped_not_fatal() {
        let library = PatternLibrary::builder()
            .pattern(FailureType::OomKilled, Severity::Critical, &["OOMKilled", "(unclosed"])
            .rules(
                FailureType::OomKilled,
                "too little memory",
                &[("broken", "[z-a]", "never compiles"), ("heap", "heap", "heap exhausted")],
            )
            .build();

        assert_eq!(library.rejected().len(), 2);
        assert_eq!(library.pattern(FailureType::OomKilled).unwrap().signatures.len(), 1);
        assert_eq!(library.rules(FailureType::OomKilled).unwrap().indicators.len(), 1);
    }

    #[test]
    fn signatures_are_case_insensitive() {
        let library = PatternLibrary::standard();
        let oom = library.pattern(FailureType::OomKilled).unwrap();
        assert_eq!(oom.match_count("container was oomkilled"), 2); // OOMKilled + Killed
    }

    #[test]
    fn healing_strategy_follows_failure_type() {
        let library = PatternLibrary::standard();
        assert_eq!(
            library.pattern(FailureType::ImagePullBackOff).unwrap().healing_strategy,
            HealingStrategy::FixImageReference
        );
        assert_eq!(
            library.pattern(FailureType::NodeNotReady).unwrap().healing_strategy,
            HealingStrategy::NoOp
        );
    }
}
