//! Confirmation Gate.
//!
//! A blocking prompt in front of destructive or high-impact mutations:
//!
//! ```text
//! Idle -> ConfirmPending -> Idle                      (cancel / backdrop)
//!                        -> InFlight -> Idle          (success or failure)
//! ```
//!
//! The mutation future is only created after the decider answers `Confirm`.
//! While it runs the gate cannot be dismissed.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, info};

use crate::mutation::MutationError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    /// Headline of the modal, e.g. "Kích hoạt hội viên"
    pub action: String,
    /// What the action applies to, e.g. a member's name
    pub target: String,
    pub destructive: bool,
}

impl ConfirmPrompt {
    pub fn new(action: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            target: target.into(),
            destructive: false,
        }
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDecision {
    Confirm,
    Cancel,
}

/// Whoever answers the prompt: a terminal, a UI, or a test script.
#[async_trait]
pub trait Decider: Send + Sync {
    async fn decide(&self, prompt: &ConfirmPrompt) -> UserDecision;
}

/// Answers every prompt the same way (`--yes`, tests).
pub struct FixedDecision(pub UserDecision);

#[async_trait]
impl Decider for FixedDecision {
    async fn decide(&self, _prompt: &ConfirmPrompt) -> UserDecision {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Idle,
    ConfirmPending(ConfirmPrompt),
    InFlight(ConfirmPrompt),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("another confirmation is already open")]
    Busy,

    #[error("no confirmation is pending")]
    NotPending,
}

#[derive(Debug)]
pub enum GateOutcome<T> {
    /// Cancelled or dismissed; nothing was sent
    Cancelled,
    Completed(T),
    Failed(MutationError),
}

impl<T> GateOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GateOutcome::Cancelled)
    }

    pub fn into_result(self) -> Option<Result<T, MutationError>> {
        match self {
            GateOutcome::Cancelled => None,
            GateOutcome::Completed(value) => Some(Ok(value)),
            GateOutcome::Failed(err) => Some(Err(err)),
        }
    }
}

/// Puts the gate back to `Idle` however a `run` ends, including when its
/// future is dropped while the prompt is still open.
struct Settle<'a>(&'a ConfirmationGate);

impl Drop for Settle<'_> {
    fn drop(&mut self) {
        *self.0.state.lock() = GateState::Idle;
    }
}

#[derive(Debug)]
pub struct ConfirmationGate {
    state: Mutex<GateState>,
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Idle),
        }
    }

    pub fn state(&self) -> GateState {
        self.state.lock().clone()
    }

    /// A mutation started from this gate is running; show the spinner.
    pub fn is_busy(&self) -> bool {
        matches!(*self.state.lock(), GateState::InFlight(_))
    }

    /// Whether the cancel control and backdrop are enabled.
    pub fn can_dismiss(&self) -> bool {
        matches!(*self.state.lock(), GateState::ConfirmPending(_))
    }

    pub fn open(&self, prompt: ConfirmPrompt) -> Result<(), GateError> {
        let mut state = self.state.lock();
        if *state != GateState::Idle {
            return Err(GateError::Busy);
        }
        *state = GateState::ConfirmPending(prompt);
        Ok(())
    }

    /// Cancel button or backdrop click. Ignored while in flight.
    pub fn dismiss(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            GateState::ConfirmPending(_) => {
                *state = GateState::Idle;
                true
            }
            _ => false,
        }
    }

    fn confirm(&self) -> Result<(), GateError> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, GateState::Idle) {
            GateState::ConfirmPending(prompt) => {
                *state = GateState::InFlight(prompt);
                Ok(())
            }
            other => {
                *state = other;
                Err(GateError::NotPending)
            }
        }
    }

    /// Ask `decider` about `prompt` and, only on `Confirm`, run `action`
    /// once.
    pub async fn run<T, F, Fut>(
        &self,
        prompt: ConfirmPrompt,
        decider: &dyn Decider,
        action: F,
    ) -> Result<GateOutcome<T>, GateError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, MutationError>>,
    {
        self.open(prompt.clone())?;
        let _settle = Settle(self);

        match decider.decide(&prompt).await {
            UserDecision::Cancel => {
                debug!(action = %prompt.action, "Confirmation cancelled");
                return Ok(GateOutcome::Cancelled);
            }
            UserDecision::Confirm => self.confirm()?,
        }

        info!(action = %prompt.action, target = %prompt.target, "Confirmed");
        Ok(match action().await {
            Ok(value) => GateOutcome::Completed(value),
            Err(err) => GateOutcome::Failed(err),
        })
    }
}
