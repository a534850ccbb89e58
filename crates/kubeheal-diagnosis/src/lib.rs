//! kubeheal Diagnosis
//!
//! Classifies failure evidence and explains it.
//!
//! # Core Operations
//!
//! - **Detect**: log text + status → ranked [`FailureType`](kubeheal_core::FailureType) list
//! - **Analyze**: failure type + log text + descriptor → [`DiagnosisResult`](kubeheal_core::DiagnosisResult)
//!
//! Both operate over a [`PatternLibrary`] shared through `Arc`. The standard
//! library is compiled once per process.

#![warn(unreachable_pub)]

pub mod analyzer;
pub mod detector;
pub mod error;
pub mod patterns;

pub use analyzer::{
    confidence, suggested_fixes, RootCauseAnalyzer, BASELINE_CONFIDENCE, CONFIDENCE_CEILING,
    CONFIDENCE_PER_INDICATOR,
};
pub use detector::{Detection, FailureDetector, STATUS_BOOST, STATUS_ONLY_SCORE};
pub use error::PatternError;
pub use patterns::{DiagnosisRuleSet, FailurePattern, Indicator, PatternLibrary, PatternLibraryBuilder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
