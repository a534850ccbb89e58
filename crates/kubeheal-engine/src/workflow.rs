//! Bounded deploy → heal → retry loop
//!
//! ```text
//! Deploying ──► Succeeded
//!     │
//!     ▼
//!   Failed ──► Aborted        (last attempt)
//!     │
//!     ▼
//!  Healing ──► Deploying      (after backoff)
//! ```
//!
//! Every transition is checked against [`allowed_transitions`].

use crate::engine::SelfHealingEngine;
use crate::error::{EngineError, WorkflowError};
use chrono::{DateTime, Utc};
use kubeheal_core::RemediationAction;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Retry-loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowState {
    /// Deploy in flight
    Deploying,
    /// Deploy succeeded (terminal)
    Succeeded,
    /// Deploy failed
    Failed,
    /// Engine is healing the descriptor
    Healing,
    /// Retries exhausted (terminal)
    Aborted,
}

impl WorkflowState {
    /// Check if no transition leaves this state
    #[must_use]
    pub fn is_terminal(self) -> bool {
        allowed_transitions(self).is_empty()
    }
}

/// States reachable from `from`
#[must_use]
pub fn allowed_transitions(from: WorkflowState) -> &'static [WorkflowState] {
    use WorkflowState::{Aborted, Deploying, Failed, Healing, Succeeded};
    match from {
        Deploying => &[Succeeded, Failed],
        Failed => &[Healing, Aborted],
        Healing => &[Deploying],
        Succeeded | Aborted => &[],
    }
}

/// Validate a state transition
///
/// # Errors
/// Returns [`WorkflowError::IllegalTransition`] when `to` is not reachable
/// from `from`.
pub fn validate_transition(from: WorkflowState, to: WorkflowState) -> Result<(), WorkflowError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(WorkflowError::IllegalTransition { from, to })
    }
}

/// Result of one deploy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployOutcome {
    /// Whether the workload came up
    pub success: bool,
    /// Status or failure text reported by the platform
    pub status: String,
    /// Short failure reason token (`OOMKilled`, `CrashLoopBackOff`)
    pub reason: Option<String>,
}

impl DeployOutcome {
    /// Successful deploy
    #[must_use]
    pub fn succeeded(status: impl Into<String>) -> Self {
        Self {
            success: true,
            status: status.into(),
            reason: None,
        }
    }

    /// Failed deploy
    #[must_use]
    pub fn failed(status: impl Into<String>) -> Self {
        Self {
            success: false,
            status: status.into(),
            reason: None,
        }
    }

    /// With reason token
    #[inline]
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Deploys descriptor text somewhere and reports what happened
pub trait Deployer {
    /// Deploy `descriptor`; `attempt` starts at 0
    fn deploy(&mut self, descriptor: &str, attempt: u32) -> DeployOutcome;
}

impl<F> Deployer for F
where
    F: FnMut(&str, u32) -> DeployOutcome,
{
    fn deploy(&mut self, descriptor: &str, attempt: u32) -> DeployOutcome {
        self(descriptor, attempt)
    }
}

/// Waits out a backoff
pub trait Sleeper {
    /// Block for `duration`
    fn sleep(&mut self, duration: Duration);
}

/// Blocking sleep on the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// One deploy and what followed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptRecord {
    /// Attempt number, starting at 0
    pub attempt: u32,
    /// Whether the deploy succeeded
    pub succeeded: bool,
    /// Status reported by the deployer
    pub status: String,
    /// Remediation applied after a failed deploy
    pub action: Option<RemediationAction>,
    /// Backoff waited before the next attempt
    pub backoff: Option<Duration>,
}

/// Outcome of [`RemediationWorkflow::run`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowReport {
    /// `Succeeded` or `Aborted`
    pub final_state: WorkflowState,
    /// One record per deploy
    pub attempts: Vec<AttemptRecord>,
    /// Descriptor text of the last deploy
    pub final_descriptor: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Wall time of the run, backoffs included
    pub elapsed: Duration,
}

impl WorkflowReport {
    /// Check if the last deploy succeeded
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.final_state == WorkflowState::Succeeded
    }

    /// Backoffs waited, in order
    #[must_use]
    pub fn backoffs(&self) -> Vec<Duration> {
        self.attempts.iter().filter_map(|a| a.backoff).collect()
    }

    /// Remediations applied, in order
    #[must_use]
    pub fn actions(&self) -> Vec<&RemediationAction> {
        self.attempts.iter().filter_map(|a| a.action.as_ref()).collect()
    }
}

/// Drives deploy attempts, healing between failures
#[derive(Debug)]
pub struct RemediationWorkflow<'a, S = ThreadSleeper> {
    engine: &'a SelfHealingEngine,
    sleeper: S,
    state: WorkflowState,
}

impl<'a> RemediationWorkflow<'a, ThreadSleeper> {
    /// Create workflow that sleeps on the current thread
    #[must_use]
    pub fn new(engine: &'a SelfHealingEngine) -> Self {
        Self::with_sleeper(engine, ThreadSleeper)
    }
}

impl<'a, S: Sleeper> RemediationWorkflow<'a, S> {
    /// Create workflow with a custom sleeper
    #[must_use]
    pub fn with_sleeper(engine: &'a SelfHealingEngine, sleeper: S) -> Self {
        Self {
            engine,
            sleeper,
            state: WorkflowState::Deploying,
        }
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Sleeper in use
    #[inline]
    #[must_use]
    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Deploy `descriptor`, healing and retrying up to `max_retries` deploys
    ///
    /// # Errors
    /// Returns [`EngineError::Parse`] when a descriptor handed to the engine
    /// does not parse, and [`EngineError::Workflow`] on a state machine
    /// violation.
    pub fn run<D>(&mut self, deployer: &mut D, descriptor: &str) -> Result<WorkflowReport, EngineError>
    where
        D: Deployer + ?Sized,
    {
        let started_at = Utc::now();
        let clock = Instant::now();
        let engine = self.engine;
        let config = engine.config();
        // A zero from the builder still gets one deploy.
        let max_retries = config.max_retries.max(1);

        self.state = WorkflowState::Deploying;
        let mut current = descriptor.to_string();
        let mut attempts = Vec::new();

        for attempt in 0..max_retries {
            if attempt > 0 {
                self.transition(WorkflowState::Deploying)?;
            }
            tracing::info!(attempt, max_retries, "deploying");
            let outcome = deployer.deploy(&current, attempt);

            if outcome.success {
                self.transition(WorkflowState::Succeeded)?;
                tracing::info!(attempt, status = %outcome.status, "deploy succeeded");
                attempts.push(AttemptRecord {
                    attempt,
                    succeeded: true,
                    status: outcome.status,
                    action: None,
                    backoff: None,
                });
                break;
            }

            self.transition(WorkflowState::Failed)?;
            tracing::warn!(
                attempt,
                status = %outcome.status,
                reason = outcome.reason.as_deref().unwrap_or("-"),
                "deploy failed"
            );

            if attempt + 1 >= max_retries {
                self.transition(WorkflowState::Aborted)?;
                tracing::error!(attempts = attempt + 1, "retries exhausted, aborting");
                attempts.push(AttemptRecord {
                    attempt,
                    succeeded: false,
                    status: outcome.status,
                    action: None,
                    backoff: None,
                });
                break;
            }

            self.transition(WorkflowState::Healing)?;
            let (healed, action) =
                engine.diagnose_and_heal(&outcome.status, &current, outcome.reason.as_deref())?;
            if healed != current {
                tracing::debug!(attempt, action_id = %action.id, "descriptor replaced");
                current = healed;
            }

            let backoff = config.backoff(attempt);
            tracing::info!(attempt, backoff_secs = backoff.as_secs(), "backing off before retry");
            self.sleeper.sleep(backoff);

            attempts.push(AttemptRecord {
                attempt,
                succeeded: false,
                status: outcome.status,
                action: Some(action),
                backoff: Some(backoff),
            });
        }

        Ok(WorkflowReport {
            final_state: self.state,
            attempts,
            final_descriptor: current,
            started_at,
            elapsed: clock.elapsed(),
        })
    }

    fn transition(&mut self, to: WorkflowState) -> Result<(), WorkflowError> {
        validate_transition(self.state, to)?;
        tracing::debug!(from = ?self.state, to = ?to, "workflow transition");
        self.state = to;
        Ok(())
    }
}
