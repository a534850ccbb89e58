//! Testing utilities for kubeheal workspace
//!
//! Shared descriptor and log fixtures, a scripted deployer and a sleeper
//! that records instead of blocking.

#![allow(missing_docs)]

use kubeheal_core::RemediationAction;
use kubeheal_engine::{DeployOutcome, Deployer, EngineConfig, SelfHealingEngine, Sleeper};
use std::collections::VecDeque;
use std::time::Duration;

/// Single-container Spring Boot deployment with probes and resources
pub const SAMPLE_MANIFEST: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: java-spring-boot
  labels:
    app: java-spring-boot
spec:
  replicas: 3
  selector:
    matchLabels:
      app: java-spring-boot
  template:
    metadata:
      labels:
        app: java-spring-boot
    spec:
      containers:
      - name: java-spring-boot
        image: openjdk:11-jre-slim
        ports:
        - containerPort: 8080
        env:
        - name: JAVA_OPTS
          value: "-Xmx512m -Xms256m"
        resources:
          requests:
            memory: "512Mi"
            cpu: "500m"
          limits:
            memory: "512Mi"
            cpu: "1000m"
        livenessProbe:
          httpGet:
            path: /health
            port: 8080
          initialDelaySeconds: 30
          periodSeconds: 10
        readinessProbe:
          httpGet:
            path: /ready
            port: 8080
          initialDelaySeconds: 5
          periodSeconds: 5
"#;

/// Two containers; the sidecar has no probes and no resources
pub const MULTI_CONTAINER_MANIFEST: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: api
spec:
  template:
    spec:
      containers:
      - name: api
        image: registry.local/api:latest
        resources:
          requests:
            memory: 8Gi
            cpu: "2"
          limits:
            memory: 8Gi
        livenessProbe:
          tcpSocket:
            port: 9000
          initialDelaySeconds: 90
      - name: log-shipper
        image: registry.local/shipper:latest
"#;

/// Valid document whose pod template has no containers list
pub const MANIFEST_WITHOUT_CONTAINERS: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: empty
spec:
  template:
    spec:
      restartPolicy: Always
"#;

/// Not valid YAML
pub const MALFORMED_MANIFEST: &str = "spec:\n  template: [unclosed\n";

pub const OOM_LOGS: &str = r#"
java.lang.OutOfMemoryError: Java heap space
Exception in thread "http-listener-1" java.lang.OutOfMemoryError: GC overhead limit exceeded
The container memory limit of 512Mi was exceeded
Observed memory usage: approximately 580Mi
Process was killed by Kubernetes due to exceeding memory limit
"#;

pub const CRASH_LOOP_LOGS: &str = r"
Error: Cannot find application.properties
java.io.FileNotFoundException: config/application.properties (No such file or directory)
App startup failed, exiting with code 1
";

pub const PENDING_LOGS: &str = r"
0/3 nodes are available: 3 Insufficient memory.
Pod was pending for more than 5 minutes.
Requested 4 CPUs but maximum available is 2 CPUs per node.
";

pub const IMAGE_PULL_LOGS: &str = r#"
Failed to pull image "registry.local/api:latest": rpc error: code = NotFound
ImagePullBackOff: Back-off pulling image "registry.local/api:latest"
"#;

pub const PROBE_FAILURE_LOGS: &str = r"
Readiness probe failed: Get http://10.1.2.3:8080/ready: context deadline exceeded
Liveness probe failed: HTTP probe failed with statuscode: 503
";

pub const HEALTHY_LOGS: &str = "Started Application in 4.2 seconds\nListening on 0.0.0.0:8080\n";

/// Engine with default configuration
pub fn engine() -> SelfHealingEngine {
    SelfHealingEngine::default()
}

/// Engine allowing `max_retries` deploys
pub fn engine_with_retries(max_retries: u32) -> SelfHealingEngine {
    SelfHealingEngine::new(EngineConfig::default().with_max_retries(max_retries))
}

/// Deployer that replays a fixed script of outcomes
///
/// The last outcome repeats once the script runs out.
#[derive(Debug, Clone)]
pub struct ScriptedDeployer {
    script: VecDeque<DeployOutcome>,
    last: DeployOutcome,
    pub deployed: Vec<String>,
}

impl ScriptedDeployer {
    pub fn new(script: impl IntoIterator<Item = DeployOutcome>) -> Self {
        let script: VecDeque<_> = script.into_iter().collect();
        let last = script
            .back()
            .cloned()
            .unwrap_or_else(|| DeployOutcome::succeeded("Running"));
        Self {
            script,
            last,
            deployed: Vec::new(),
        }
    }

    /// Fails `failures` times with `status`/`reason`, then succeeds
    pub fn fail_then_succeed(failures: usize, status: &str, reason: &str) -> Self {
        let failed = DeployOutcome::failed(status).with_reason(reason);
        Self::new(
            std::iter::repeat(failed)
                .take(failures)
                .chain(std::iter::once(DeployOutcome::succeeded("Running"))),
        )
    }

    /// Fails forever with `status`/`reason`
    pub fn always_fail(status: &str, reason: &str) -> Self {
        Self::new([DeployOutcome::failed(status).with_reason(reason)])
    }
}

impl Deployer for ScriptedDeployer {
    fn deploy(&mut self, descriptor: &str, _attempt: u32) -> DeployOutcome {
        self.deployed.push(descriptor.to_string());
        self.script.pop_front().unwrap_or_else(|| self.last.clone())
    }
}

/// Sleeper that records requested durations and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    pub slept: Vec<Duration>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration) {
        self.slept.push(duration);
    }
}

/// Fields touched by an action, in order
pub fn modified_fields(action: &RemediationAction) -> Vec<&str> {
    action.modifications.iter().map(|m| m.field.as_str()).collect()
}

/// Whole seconds of each duration
pub fn as_secs(durations: &[Duration]) -> Vec<u64> {
    durations.iter().map(Duration::as_secs).collect()
}
