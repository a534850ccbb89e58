//! Root-cause analysis
//!
//! Scores a diagnosis for one failure type from indicator matches in the
//! logs, adds read-only observations from the descriptor, and attaches the
//! static fix suggestions for the type.

use crate::patterns::PatternLibrary;
use kubeheal_core::{DiagnosisResult, FailureType, FixPriority, SuggestedFix};
use kubeheal_manifest::{Descriptor, ParseError, FIRST_CONTAINER_RESOURCES_PATH};
use std::sync::Arc;

/// Confidence with no matching indicator
pub const BASELINE_CONFIDENCE: u8 = 50;

/// Confidence added per matching indicator
pub const CONFIDENCE_PER_INDICATOR: u8 = 15;

/// Highest confidence indicators alone can reach
pub const CONFIDENCE_CEILING: u8 = 95;

const UNKNOWN_CAUSE: &str = "Unknown cause";

/// Produces scored diagnoses
#[derive(Debug, Clone)]
pub struct RootCauseAnalyzer {
    library: Arc<PatternLibrary>,
}

impl Default for RootCauseAnalyzer {
    fn default() -> Self {
        Self::new(PatternLibrary::standard())
    }
}

impl RootCauseAnalyzer {
    /// Create analyzer over a pattern library
    #[inline]
    #[must_use]
    pub fn new(library: Arc<PatternLibrary>) -> Self {
        Self { library }
    }

    /// Analyze a failure, parsing the descriptor text when given
    ///
    /// # Errors
    /// Returns [`ParseError`] when `descriptor` is not a valid document.
    pub fn analyze(
        &self,
        failure_type: FailureType,
        log_text: &str,
        descriptor: Option<&str>,
    ) -> Result<DiagnosisResult, ParseError> {
        let parsed = descriptor.map(Descriptor::parse).transpose()?;
        Ok(self.analyze_descriptor(failure_type, log_text, parsed.as_ref()))
    }

    /// Analyze a failure against an already parsed descriptor
    #[must_use]
    pub fn analyze_descriptor(
        &self,
        failure_type: FailureType,
        log_text: &str,
        descriptor: Option<&Descriptor>,
    ) -> DiagnosisResult {
        let mut evidence = Vec::new();
        let mut matched = 0_usize;

        let root_cause = match self.library.rules(failure_type) {
            Some(rules) => {
                for indicator in &rules.indicators {
                    if indicator.regex.is_match(log_text) {
                        evidence.push(format!("{}: {}", indicator.name, indicator.explanation));
                        matched += 1;
                    }
                }
                rules.typical_cause.clone()
            }
            None => UNKNOWN_CAUSE.to_string(),
        };

        if let Some(descriptor) = descriptor {
            evidence.extend(descriptor_evidence(failure_type, descriptor));
        }

        let diagnosis = DiagnosisResult {
            failure_type,
            root_cause,
            confidence: confidence(matched),
            evidence,
            suggested_fixes: suggested_fixes(failure_type),
            severity: self.library.severity(failure_type),
        };

        tracing::info!(
            %failure_type,
            root_cause = %diagnosis.root_cause,
            confidence = diagnosis.confidence,
            severity = %diagnosis.severity,
            indicators = matched,
            "diagnosed failure"
        );
        for item in &diagnosis.evidence {
            tracing::debug!(evidence = %item);
        }

        diagnosis
    }
}

/// `min(95, 50 + 15 × matched)`
#[must_use]
pub fn confidence(matched: usize) -> u8 {
    let boost = u8::try_from(matched)
        .unwrap_or(u8::MAX)
        .saturating_mul(CONFIDENCE_PER_INDICATOR);
    BASELINE_CONFIDENCE
        .saturating_add(boost)
        .min(CONFIDENCE_CEILING)
}

/// Observations read from the first container's resources
fn descriptor_evidence(failure_type: FailureType, descriptor: &Descriptor) -> Option<String> {
    let read = |field: &str| {
        descriptor
            .get_text(&format!("{FIRST_CONTAINER_RESOURCES_PATH}.{field}"))
            .unwrap_or_else(|| "unknown".to_string())
    };

    match failure_type {
        FailureType::OomKilled => Some(format!("Manifest shows memory limit: {}", read("limits.memory"))),
        FailureType::Pending => Some(format!(
            "Manifest shows requests: memory={}, cpu={}",
            read("requests.memory"),
            read("requests.cpu")
        )),
        _ => None,
    }
}

/// Static fix table, three entries per healable type
#[must_use]
pub fn suggested_fixes(failure_type: FailureType) -> Vec<SuggestedFix> {
    let table: &[(&str, &str)] = match failure_type {
        FailureType::OomKilled => &[
            ("increase_memory_limit", "Increase memory limit by 50-100%"),
            ("increase_memory_request", "Increase memory request proportionally"),
            ("enable_jvm_metrics", "Monitor JVM heap usage (for Java apps)"),
        ],
        FailureType::CrashLoopBackOff => &[
            ("increase_startup_delay", "Increase probe initialDelaySeconds"),
            ("check_dependencies", "Verify dependencies are available"),
            ("add_startup_probe", "Add startup probe for slow-starting apps"),
        ],
        FailureType::ImagePullBackOff => &[
            ("verify_image_name", "Verify image name and registry"),
            ("add_pull_secret", "Add imagePullSecrets for private registries"),
            ("use_explicit_tag", "Use explicit image tag instead of :latest"),
        ],
        FailureType::Pending => &[
            ("reduce_memory_request", "Reduce memory request"),
            ("reduce_cpu_request", "Reduce CPU request"),
            ("check_node_selectors", "Review node selectors and affinity rules"),
        ],
        FailureType::ProbeFailure => &[
            ("increase_probe_delay", "Increase probe initialDelaySeconds"),
            ("increase_probe_timeout", "Increase probe timeoutSeconds"),
            ("verify_endpoint", "Verify health check endpoint exists"),
        ],
        FailureType::NodeNotReady | FailureType::Unknown => &[],
    };

    [FixPriority::Primary, FixPriority::Secondary, FixPriority::Tertiary]
        .into_iter()
        .zip(table)
        .map(|(priority, (action, description))| SuggestedFix::new(priority, *action, *description))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kubeheal_core::Severity;

    const MANIFEST: &str = r#"
apiVersion: apps/v1
kind: Deployment
spec:
  template:
    spec:
      containers:
      - name: api
        resources:
          requests:
            memory: "2Gi"
            cpu: "1500m"
          limits:
            memory: "512Mi"
"#;

    #[test]
    fn confidence_formula() {
        assert_eq!(confidence(0), 50);
        assert_eq!(confidence(1), 65);
        assert_eq!(confidence(2), 80);
        assert_eq!(confidence(3), 95);
        assert_eq!(confidence(4), 95);
        assert_eq!(confidence(usize::MAX), 95);
    }

    #[test]
    fn indicators_build_evidence() {
        let analyzer = RootCauseAnalyzer::default();
        let logs = "JAVA_OPTS=-Xmx512m\nparallel workers: 64\n";
        let d = analyzer.analyze(FailureType::OomKilled, logs, None).unwrap();

        assert_eq!(d.confidence, 80);
        assert_eq!(
            d.evidence,
            vec![
                "java_heap: Java heap size may be too small".to_string(),
                "concurrent_load: High concurrency may increase memory usage".to_string(),
            ]
        );
        assert_eq!(d.root_cause, "Container memory limit insufficient for application workload");
        assert_eq!(d.severity, Severity::Critical);
        assert_eq!(d.suggested_fixes.len(), 3);
        assert_eq!(d.suggested_fixes[0].priority, FixPriority::Primary);
        assert_eq!(d.suggested_fixes[0].action, "increase_memory_limit");
    }

    #[test]
    fn descriptor_adds_memory_limit_for_oom() {
        let analyzer = RootCauseAnalyzer::default();
        let d = analyzer.analyze(FailureType::OomKilled, "", Some(MANIFEST)).unwrap();
        assert_eq!(d.evidence, vec!["Manifest shows memory limit: 512Mi".to_string()]);
        assert_eq!(d.confidence, 50);
    }

    #[test]
    fn descriptor_adds_requests_for_pending() {
        let analyzer = RootCauseAnalyzer::default();
        let d = analyzer.analyze(FailureType::Pending, "", Some(MANIFEST)).unwrap();
        assert_eq!(
            d.evidence,
            vec!["Manifest shows requests: memory=2Gi, cpu=1500m".to_string()]
        );
    }

    #[test]
    fn descriptor_without_resources_reports_unknown() {
        let analyzer = RootCauseAnalyzer::default();
        let d = analyzer
            .analyze(FailureType::OomKilled, "", Some("kind: Deployment\n"))
            .unwrap();
        assert_eq!(d.evidence, vec!["Manifest shows memory limit: unknown".to_string()]);
    }

    #[test]
    fn unknown_type_is_baseline() {
        let analyzer = RootCauseAnalyzer::default();
        let d = analyzer.analyze(FailureType::Unknown, "whatever", Some(MANIFEST)).unwrap();
        assert_eq!(d.confidence, 50);
        assert_eq!(d.root_cause, "Unknown cause");
        assert!(d.evidence.is_empty());
        assert!(d.suggested_fixes.is_empty());
        assert_eq!(d.severity, Severity::Unknown);
    }

    #[test]
    fn node_not_ready_has_severity_but_no_rules() {
        let analyzer = RootCauseAnalyzer::default();
        let d = analyzer.analyze(FailureType::NodeNotReady, "node not ready", None).unwrap();
        assert_eq!(d.root_cause, "Unknown cause");
        assert_eq!(d.severity, Severity::High);
        assert!(d.suggested_fixes.is_empty());
    }

    #[test]
    fn malformed_descriptor_propagates() {
        let analyzer = RootCauseAnalyzer::default();
        let result = analyzer.analyze(FailureType::OomKilled, "", Some("spec: [broken"));
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }
}
