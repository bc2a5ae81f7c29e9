//! State machine for a single provisioning call.
//!
//! # State Transitions
//!
//! ```text
//! Validating
//!     ↓
//! CreatingIdentity
//!     ↓
//! SavingConfig
//!     ↓
//! StoringSecret
//!     ↓
//! RegisteringEndpoint
//!     ↓
//! SeedingResources
//!     ↓
//! Done
//! ```
//!
//! Any non-terminal state can move to `Failed(step)`. `Done` and `Failed` are
//! terminal; transitions only ever move forward.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::ProvisionStep;

/// State of a provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningState {
    Validating,
    CreatingIdentity,
    SavingConfig,
    StoringSecret,
    RegisteringEndpoint,
    SeedingResources,
    Done,
    Failed(ProvisionStep),
}

impl ProvisioningState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProvisioningState::Done | ProvisioningState::Failed(_))
    }

    /// The step a non-terminal state is executing.
    pub fn step(&self) -> Option<ProvisionStep> {
        match self {
            ProvisioningState::Validating => Some(ProvisionStep::Validating),
            ProvisioningState::CreatingIdentity => Some(ProvisionStep::CreatingIdentity),
            ProvisioningState::SavingConfig => Some(ProvisionStep::SavingConfig),
            ProvisioningState::StoringSecret => Some(ProvisionStep::StoringSecret),
            ProvisioningState::RegisteringEndpoint => Some(ProvisionStep::RegisteringEndpoint),
            ProvisioningState::SeedingResources => Some(ProvisionStep::SeedingResources),
            ProvisioningState::Done | ProvisioningState::Failed(_) => None,
        }
    }

    fn next(&self) -> Option<ProvisioningState> {
        match self {
            ProvisioningState::Validating => Some(ProvisioningState::CreatingIdentity),
            ProvisioningState::CreatingIdentity => Some(ProvisioningState::SavingConfig),
            ProvisioningState::SavingConfig => Some(ProvisioningState::StoringSecret),
            ProvisioningState::StoringSecret => Some(ProvisioningState::RegisteringEndpoint),
            ProvisioningState::RegisteringEndpoint => Some(ProvisioningState::SeedingResources),
            ProvisioningState::SeedingResources => Some(ProvisioningState::Done),
            ProvisioningState::Done | ProvisioningState::Failed(_) => None,
        }
    }
}

impl fmt::Display for ProvisioningState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningState::Done => f.write_str("DONE"),
            ProvisioningState::Failed(step) => write!(f, "FAILED({step})"),
            other => match other.step() {
                Some(step) => f.write_str(step.as_str()),
                None => Ok(()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),
}

/// Record of a state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from_state: ProvisioningState,
    pub to_state: ProvisioningState,
    /// Unix epoch milliseconds
    pub timestamp: u64,
}

/// Forward-only state machine for one provisioning call.
#[derive(Debug)]
pub struct ProvisioningRun {
    participant_context_id: String,
    current_state: ProvisioningState,
    history: Vec<StateTransition>,
}

impl ProvisioningRun {
    /// Create a new run in `Validating` state.
    pub fn new(participant_context_id: impl Into<String>) -> Self {
        Self {
            participant_context_id: participant_context_id.into(),
            current_state: ProvisioningState::Validating,
            history: Vec::with_capacity(7),
        }
    }

    pub fn participant_context_id(&self) -> &str {
        &self.participant_context_id
    }

    pub fn current_state(&self) -> ProvisioningState {
        self.current_state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn is_done(&self) -> bool {
        self.current_state == ProvisioningState::Done
    }

    /// Step currently executing, or the last one reached once terminal.
    pub fn last_step(&self) -> ProvisionStep {
        match self.current_state {
            ProvisioningState::Failed(step) => step,
            ProvisioningState::Done => ProvisionStep::SeedingResources,
            state => state.step().unwrap_or(ProvisionStep::Validating),
        }
    }

    /// Move to the next step after the current one succeeded.
    pub fn advance(&mut self) -> Result<ProvisioningState, RunError> {
        let next = self.current_state.next().ok_or_else(|| {
            RunError::InvalidTransition(format!("cannot advance from {}", self.current_state))
        })?;
        self.transition(next);
        Ok(next)
    }

    /// Record a failure of the step currently executing.
    pub fn fail(&mut self) -> Result<ProvisionStep, RunError> {
        let step = self.current_state.step().ok_or_else(|| {
            RunError::InvalidTransition(format!("cannot fail from {}", self.current_state))
        })?;
        self.transition(ProvisioningState::Failed(step));
        Ok(step)
    }

    fn transition(&mut self, new_state: ProvisioningState) {
        let transition = StateTransition {
            from_state: self.current_state,
            to_state: new_state,
            timestamp: current_timestamp(),
        };

        tracing::debug!(
            participant_context_id = %self.participant_context_id,
            from = %transition.from_state,
            to = %transition.to_state,
            "provisioning state transition"
        );

        self.current_state = new_state;
        self.history.push(transition);
    }
}

/// Get current timestamp in milliseconds.
fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_reaches_done() {
        let mut run = ProvisioningRun::new("p1");
        assert_eq!(run.current_state(), ProvisioningState::Validating);

        for _ in 0..6 {
            run.advance().unwrap();
        }

        assert!(run.is_done());
        assert_eq!(run.history().len(), 6);
        assert_eq!(run.history()[0].to_state, ProvisioningState::CreatingIdentity);
        assert_eq!(run.history()[5].to_state, ProvisioningState::Done);
    }

    #[test]
    fn test_failure_records_step() {
        let mut run = ProvisioningRun::new("p1");
        run.advance().unwrap();
        run.advance().unwrap();

        let step = run.fail().unwrap();
        assert_eq!(step, ProvisionStep::SavingConfig);
        assert_eq!(
            run.current_state(),
            ProvisioningState::Failed(ProvisionStep::SavingConfig)
        );
    }

    #[test]
    fn test_terminal_states_reject_transitions() {
        let mut run = ProvisioningRun::new("p1");
        run.fail().unwrap();
        assert!(matches!(run.advance(), Err(RunError::InvalidTransition(_))));
        assert!(matches!(run.fail(), Err(RunError::InvalidTransition(_))));

        let mut done = ProvisioningRun::new("p2");
        while !done.is_done() {
            done.advance().unwrap();
        }
        assert!(done.advance().is_err());
        assert!(done.fail().is_err());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ProvisioningState::CreatingIdentity.to_string(), "CREATING_IDENTITY");
        assert_eq!(ProvisioningState::Done.to_string(), "DONE");
        assert_eq!(
            ProvisioningState::Failed(ProvisionStep::StoringSecret).to_string(),
            "FAILED(STORING_SECRET)"
        );
    }
}
