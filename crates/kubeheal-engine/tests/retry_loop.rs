//! Retry loop driven by scripted deployers

use kubeheal_core::FailureType;
use kubeheal_engine::{
    DeployOutcome, EngineConfig, EngineError, RemediationWorkflow, SelfHealingEngine, WorkflowState,
};
use kubeheal_manifest::Descriptor;
use kubeheal_test_utils::*;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[test]
fn fail_once_then_succeed() {
    let engine = engine();
    let mut deployer = ScriptedDeployer::fail_then_succeed(1, "container OOMKilled", "OOMKilled");
    let mut workflow = RemediationWorkflow::with_sleeper(&engine, RecordingSleeper::default());

    let report = workflow.run(&mut deployer, SAMPLE_MANIFEST).unwrap();

    assert_eq!(report.final_state, WorkflowState::Succeeded);
    assert_eq!(report.attempts.len(), 2);
    assert_eq!(report.backoffs(), vec![Duration::from_secs(1)]);
    assert_eq!(as_secs(&workflow.sleeper().slept), vec![1]);

    let first = &report.attempts[0];
    assert!(!first.succeeded);
    assert_eq!(first.action.as_ref().map(|a| a.failure_type), Some(FailureType::OomKilled));
    assert!(report.attempts[1].succeeded);
    assert!(report.attempts[1].action.is_none());

    // The second deploy sees the healed descriptor.
    assert_eq!(deployer.deployed.len(), 2);
    assert_eq!(deployer.deployed[0], SAMPLE_MANIFEST);
    let second = Descriptor::parse(&deployer.deployed[1]).unwrap();
    assert_eq!(
        second
            .get_text("spec.template.spec.containers[0].resources.limits.memory")
            .as_deref(),
        Some("1024Mi")
    );
    assert_eq!(report.final_descriptor, deployer.deployed[1]);
}

#[test]
fn always_failing_aborts_after_max_retries() {
    let engine = engine();
    let mut deployer = ScriptedDeployer::always_fail("Back-off restarting failed container", "CrashLoopBackOff");
    let mut workflow = RemediationWorkflow::with_sleeper(&engine, RecordingSleeper::default());

    let report = workflow.run(&mut deployer, SAMPLE_MANIFEST).unwrap();
    let max_retries = engine.config().max_retries as usize;

    assert_eq!(report.final_state, WorkflowState::Aborted);
    assert!(!report.succeeded());
    assert_eq!(deployer.deployed.len(), max_retries);
    assert_eq!(report.attempts.len(), max_retries);
    assert_eq!(as_secs(&report.backoffs()), vec![1, 2]);
    assert_eq!(engine.audit_trail().len(), max_retries - 1);
    assert!(report.attempts.last().unwrap().action.is_none());
    assert!(engine.audit().verify_integrity().is_ok());
    assert_eq!(workflow.state(), WorkflowState::Aborted);
}

#[test]
fn backoff_is_capped() {
    let engine = engine_with_retries(6);
    let mut deployer = ScriptedDeployer::always_fail("pod Pending", "Pending");
    let mut workflow = RemediationWorkflow::with_sleeper(&engine, RecordingSleeper::default());

    let report = workflow.run(&mut deployer, SAMPLE_MANIFEST).unwrap();

    assert_eq!(as_secs(&report.backoffs()), vec![1, 2, 4, 8, 8]);
    assert_eq!(report.attempts.len(), 6);
}

#[test]
fn repeated_healing_converges() {
    let engine = engine_with_retries(5);
    let mut deployer = ScriptedDeployer::always_fail("CrashLoopBackOff", "CrashLoopBackOff");
    let mut workflow = RemediationWorkflow::with_sleeper(&engine, RecordingSleeper::default());

    let report = workflow.run(&mut deployer, SAMPLE_MANIFEST).unwrap();
    let last = Descriptor::parse(&report.final_descriptor).unwrap();

    assert_eq!(
        last.get_text("spec.template.spec.containers[0].livenessProbe.initialDelaySeconds")
            .as_deref(),
        Some("120")
    );
    // Once capped, a cycle changes nothing and the descriptor is deployed as is.
    let actions = report.actions();
    assert!(actions.last().unwrap().modifications.is_empty());
    assert_eq!(deployer.deployed[3], deployer.deployed[4]);
}

#[test]
fn unparseable_descriptor_surfaces_on_first_heal() {
    let engine = engine();
    let mut deployer = ScriptedDeployer::always_fail("OOMKilled", "OOMKilled");
    let mut workflow = RemediationWorkflow::with_sleeper(&engine, RecordingSleeper::default());

    let err = workflow.run(&mut deployer, MALFORMED_MANIFEST).unwrap_err();

    assert!(matches!(err, EngineError::Parse(_)));
    assert_eq!(deployer.deployed.len(), 1);
    assert!(workflow.sleeper().slept.is_empty());
    assert_eq!(workflow.state(), WorkflowState::Healing);
}

#[test]
fn closures_are_deployers() {
    let engine = SelfHealingEngine::new(EngineConfig::default().with_max_retries(2));
    let mut workflow = RemediationWorkflow::with_sleeper(&engine, RecordingSleeper::default());
    let mut deployer = |_: &str, attempt: u32| {
        if attempt == 0 {
            DeployOutcome::failed("ImagePullBackOff").with_reason("ImagePullBackOff")
        } else {
            DeployOutcome::succeeded("Running")
        }
    };

    let report = workflow.run(&mut deployer, SAMPLE_MANIFEST).unwrap();
    assert!(report.succeeded());
    assert_eq!(report.actions()[0].failure_type, FailureType::ImagePullBackOff);
}

#[test]
fn report_serializes() {
    let engine = engine();
    let mut deployer = ScriptedDeployer::fail_then_succeed(1, "OOMKilled", "OOMKilled");
    let mut workflow = RemediationWorkflow::with_sleeper(&engine, RecordingSleeper::default());

    let report = workflow.run(&mut deployer, SAMPLE_MANIFEST).unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["final_state"], "Succeeded");
    assert_eq!(json["attempts"][0]["backoff"]["secs"], 1);
    assert_eq!(json["attempts"][0]["action"]["failure_type"], "OOMKilled");
    assert!(json["attempts"][1]["action"].is_null());
}
