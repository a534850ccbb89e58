//! kubeheal Engine
//!
//! Diagnoses workload failures, heals their descriptors, and records every
//! decision in a tamper-evident audit trail.
//!
//! # Core Concepts
//!
//! - [`SelfHealingEngine`]: one diagnose → heal → audit cycle per call
//! - [`AuditTrail`]: hash-chained history of [`RemediationAction`](kubeheal_core::RemediationAction)s
//! - [`RemediationWorkflow`]: bounded deploy/heal/retry loop over a [`Deployer`]
//! - [`EngineConfig`]: retry and backoff settings, loadable from TOML
//!
//! # Example
//!
//! ```
//! use kubeheal_engine::SelfHealingEngine;
//!
//! let engine = SelfHealingEngine::default();
//! let descriptor = "kind: Deployment\nspec:\n  template:\n    spec:\n      containers:\n      - name: api\n        resources:\n          requests:\n            memory: 512Mi\n";
//! let (healed, action) = engine
//!     .diagnose_and_heal("OOMKilled", descriptor, None)
//!     .unwrap();
//!
//! assert!(healed.contains("1024Mi"));
//! assert_eq!(action.modifications.len(), 1);
//! ```

#![warn(unreachable_pub)]

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod telemetry;
pub mod workflow;

pub use audit::{AuditEntry, AuditTrail, GENESIS_HASH};
pub use config::EngineConfig;
pub use engine::SelfHealingEngine;
pub use error::{AuditError, ConfigError, EngineError, EngineResult, TelemetryError, WorkflowError};
pub use telemetry::{init_tracing, TracingConfig};
pub use workflow::{
    allowed_transitions, validate_transition, AttemptRecord, DeployOutcome, Deployer,
    RemediationWorkflow, Sleeper, ThreadSleeper, WorkflowReport, WorkflowState,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
