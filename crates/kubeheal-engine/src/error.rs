//! Error types for the engine
//!
//! Provides error handling for:
//! - Healing cycles (descriptor parse failures)
//! - The retry loop (state machine violations)
//! - Configuration loading
//! - Audit verification and export
//! - Tracing initialisation

use crate::workflow::WorkflowState;
use kubeheal_manifest::ParseError;

/// Errors surfaced by the engine and the retry loop
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Descriptor text could not be parsed
    #[error("descriptor parse error: {0}")]
    Parse(#[from] ParseError),

    /// Retry loop broke its state machine
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Configuration was rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Check if the engine itself is unusable after this error
    ///
    /// A parse error only ends the current cycle; a different descriptor can
    /// still be healed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            EngineError::Parse(_) => false,
            EngineError::Workflow(_) | EngineError::Config(_) => true,
        }
    }
}

/// Retry-loop state machine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// Transition not in the allowed-transition table
    #[error("illegal transition {from:?} -> {to:?}")]
    IllegalTransition {
        /// Current state
        from: WorkflowState,
        /// Requested state
        to: WorkflowState,
    },
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// TOML text did not deserialize
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A value is out of range
    #[error("{field}: {reason}")]
    OutOfRange {
        /// Offending field
        field: &'static str,
        /// Constraint it violates
        reason: &'static str,
    },
}

/// Audit trail errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// Hash chain broken at an entry
    #[error("audit integrity violation at entry {index}")]
    IntegrityViolation {
        /// Position of the first bad entry
        index: usize,
    },

    /// JSON export failed
    #[error("audit export failed: {0}")]
    Export(String),
}

/// Tracing initialisation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelemetryError {
    /// A global subscriber is already installed or the filter is invalid
    #[error("tracing init failed: {0}")]
    Init(String),
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
