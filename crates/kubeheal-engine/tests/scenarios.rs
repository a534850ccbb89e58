//! End-to-end healing cycles over the sample deployment

use kubeheal_core::{FailureType, Severity};
use kubeheal_engine::{EngineError, SelfHealingEngine};
use kubeheal_manifest::{Descriptor, HealOptions};
use kubeheal_test_utils::*;
use pretty_assertions::assert_eq;

const C0: &str = "spec.template.spec.containers[0]";

fn text(descriptor: &Descriptor, field: &str) -> Option<String> {
    descriptor.get_text(&format!("{C0}.{field}"))
}

#[test]
fn oom_doubles_memory_request_and_limit() {
    let engine = engine();
    let (healed, action) = engine
        .diagnose_and_heal(OOM_LOGS, SAMPLE_MANIFEST, Some("OOMKilled"))
        .unwrap();

    assert_eq!(action.failure_type, FailureType::OomKilled);
    assert_eq!(action.risk_level, Severity::Critical);
    assert_eq!(action.rationale, "Applied OOMKilled remediation with 50% confidence");
    assert_eq!(modified_fields(&action), vec![format!("{C0}.resources.requests.memory")]);
    assert_eq!(action.modifications[0].old_value, "512Mi");
    assert_eq!(action.modifications[0].new_value, "1024Mi");
    assert_eq!(action.modifications[0].container_name.as_deref(), Some("java-spring-boot"));

    let healed = Descriptor::parse(&healed).unwrap();
    assert_eq!(text(&healed, "resources.requests.memory").as_deref(), Some("1024Mi"));
    assert_eq!(text(&healed, "resources.limits.memory").as_deref(), Some("1024Mi"));
    assert_eq!(text(&healed, "resources.requests.cpu").as_deref(), Some("500m"));
    assert_eq!(text(&healed, "resources.limits.cpu").as_deref(), Some("1000m"));
}

#[test]
fn crash_loop_extends_probes_and_adds_startup_probe() {
    let engine = engine();
    let (healed, action) = engine
        .diagnose_and_heal(CRASH_LOOP_LOGS, SAMPLE_MANIFEST, Some("CrashLoopBackOff"))
        .unwrap();

    assert_eq!(action.failure_type, FailureType::CrashLoopBackOff);
    assert_eq!(action.risk_level, Severity::High);
    assert_eq!(action.confidence, 65);
    assert_eq!(
        modified_fields(&action),
        vec![
            format!("{C0}.livenessProbe.initialDelaySeconds"),
            format!("{C0}.readinessProbe.initialDelaySeconds"),
            format!("{C0}.startupProbe"),
        ]
    );

    let healed = Descriptor::parse(&healed).unwrap();
    assert_eq!(text(&healed, "livenessProbe.initialDelaySeconds").as_deref(), Some("60"));
    assert_eq!(text(&healed, "readinessProbe.initialDelaySeconds").as_deref(), Some("25"));
    assert_eq!(text(&healed, "startupProbe.failureThreshold").as_deref(), Some("30"));
    assert_eq!(text(&healed, "startupProbe.httpGet.port").as_deref(), Some("8080"));
    assert_eq!(text(&healed, "startupProbe.httpGet.path").as_deref(), Some("/health"));
}

#[test]
fn unmatched_failure_leaves_descriptor_untouched() {
    let engine = engine();
    let (healed, action) = engine
        .diagnose_and_heal(HEALTHY_LOGS, SAMPLE_MANIFEST, None)
        .unwrap();

    assert_eq!(healed, SAMPLE_MANIFEST);
    assert_eq!(action.failure_type, FailureType::Unknown);
    assert_eq!(action.root_cause, "Unknown cause");
    assert!(action.modifications.is_empty());
    assert_eq!(action.risk_level, Severity::Unknown);
    assert_eq!(action.risk_level.to_string(), "UNKNOWN");
}

#[test]
fn pending_halves_requests_with_floors() {
    let engine = engine();
    let (healed, action) = engine
        .diagnose_and_heal(PENDING_LOGS, MULTI_CONTAINER_MANIFEST, Some("Pending"))
        .unwrap();

    assert_eq!(action.failure_type, FailureType::Pending);
    assert!(action
        .modifications
        .iter()
        .all(|m| m.container_name.as_deref() == Some("api")));

    let healed = Descriptor::parse(&healed).unwrap();
    assert_eq!(text(&healed, "resources.requests.memory").as_deref(), Some("4Gi"));
    assert_eq!(text(&healed, "resources.requests.cpu").as_deref(), Some("1"));
    assert_eq!(text(&healed, "resources.limits.memory").as_deref(), Some("8Gi"));
}

#[test]
fn image_pull_pins_latest_in_every_container() {
    let engine = engine();
    let (healed, action) = engine
        .diagnose_and_heal(IMAGE_PULL_LOGS, MULTI_CONTAINER_MANIFEST, Some("ImagePullBackOff"))
        .unwrap();

    assert_eq!(action.failure_type, FailureType::ImagePullBackOff);
    assert_eq!(action.modifications.len(), 2);

    let healed = Descriptor::parse(&healed).unwrap();
    assert_eq!(
        healed.get_text("spec.template.spec.containers[0].image").as_deref(),
        Some("registry.local/api:stable")
    );
    assert_eq!(
        healed.get_text("spec.template.spec.containers[1].image").as_deref(),
        Some("registry.local/shipper:stable")
    );
}

#[test]
fn explicit_options_override_config() {
    let engine = engine();
    let options = HealOptions::default().with_suggested_image("openjdk:17-jre-slim");
    let (healed, action) = engine
        .diagnose_and_heal_with("ImagePullBackOff", SAMPLE_MANIFEST, None, &options)
        .unwrap();

    assert_eq!(action.modifications[0].old_value, "openjdk:11-jre-slim");
    assert!(healed.contains("openjdk:17-jre-slim"));
}

#[test]
fn probe_failure_relaxes_timing() {
    let engine = engine();
    let (healed, action) = engine
        .diagnose_and_heal(PROBE_FAILURE_LOGS, SAMPLE_MANIFEST, None)
        .unwrap();

    assert_eq!(action.failure_type, FailureType::ProbeFailure);
    assert_eq!(action.risk_level, Severity::Medium);

    let healed = Descriptor::parse(&healed).unwrap();
    assert_eq!(text(&healed, "livenessProbe.initialDelaySeconds").as_deref(), Some("45"));
    assert_eq!(text(&healed, "livenessProbe.timeoutSeconds").as_deref(), Some("3"));
    assert_eq!(text(&healed, "readinessProbe.periodSeconds").as_deref(), Some("10"));
}

#[test]
fn missing_containers_degrades_to_no_op() {
    let engine = engine();
    let (healed, action) = engine
        .diagnose_and_heal(OOM_LOGS, MANIFEST_WITHOUT_CONTAINERS, Some("OOMKilled"))
        .unwrap();

    assert_eq!(healed, MANIFEST_WITHOUT_CONTAINERS);
    assert_eq!(action.failure_type, FailureType::OomKilled);
    assert!(action.modifications.is_empty());
    assert_eq!(engine.audit_trail().len(), 1);
}

#[test]
fn malformed_descriptor_is_a_parse_error() {
    let engine = engine();
    let err = engine
        .diagnose_and_heal(OOM_LOGS, MALFORMED_MANIFEST, None)
        .unwrap_err();

    assert!(matches!(err, EngineError::Parse(_)));
    assert!(!err.is_fatal());
    assert!(engine.audit_trail().is_empty());
}

#[test]
fn audit_trail_accumulates_and_verifies() {
    let engine = SelfHealingEngine::default();
    engine.diagnose_and_heal(OOM_LOGS, SAMPLE_MANIFEST, None).unwrap();
    engine.diagnose_and_heal(CRASH_LOOP_LOGS, SAMPLE_MANIFEST, None).unwrap();
    engine.diagnose_and_heal(HEALTHY_LOGS, SAMPLE_MANIFEST, None).unwrap();

    let types: Vec<_> = engine.audit_trail().iter().map(|a| a.failure_type).collect();
    assert_eq!(
        types,
        vec![FailureType::OomKilled, FailureType::CrashLoopBackOff, FailureType::Unknown]
    );
    assert!(engine.audit().verify_integrity().is_ok());

    let json = engine.audit().to_json().unwrap();
    assert!(json.contains("\"failure_type\": \"CrashLoopBackOff\""));
}
