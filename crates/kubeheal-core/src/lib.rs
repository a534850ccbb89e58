//! kubeheal Core
//!
//! Shared vocabulary of the remediation engine.
//!
//! # Core Concepts
//!
//! - [`FailureType`]: closed set of workload failures the engine classifies
//! - [`DiagnosisResult`]: scored root-cause analysis for one failure
//! - [`HealingStrategy`]: structural edit bound to each failure type
//! - [`RemediationAction`]: audit record of one healing cycle

#![warn(unreachable_pub)]

mod diagnosis;
mod failure;
mod remediation;

pub use diagnosis::{DiagnosisResult, FixPriority, SuggestedFix, MAX_CONFIDENCE};
pub use failure::{FailureType, HealingStrategy, Severity, UnknownFailureName};
pub use remediation::{ActionId, Modification, RemediationAction, SkippedField};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
