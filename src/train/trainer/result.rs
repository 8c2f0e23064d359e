//! Run result types

use std::fmt;

use crate::error::Error;
use crate::train::event::Termination;
use crate::train::state::LoopState;

/// Result of a run that reached a terminal event
#[derive(Debug, Clone)]
pub struct RunOutcome<S> {
    /// Final loop state
    pub state: LoopState<S>,
    /// Wall-clock run time in seconds
    pub elapsed_secs: f64,
}

impl<S> RunOutcome<S> {
    /// Terminal state of the run: `Completed` or `HaltedLoop`
    pub fn termination(&self) -> Termination {
        self.state.termination()
    }

    /// Whether every epoch ran
    pub fn is_completed(&self) -> bool {
        self.termination() == Termination::Completed
    }

    /// Whether a handler halted the run
    pub fn is_halted(&self) -> bool {
        self.termination() == Termination::HaltedLoop
    }

    /// Final metric value for `name`
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.state.metric(name)
    }

    /// Consume the outcome, returning the step state
    pub fn into_step_state(self) -> S {
        self.state.into_step_state()
    }
}

/// A run aborted by an error
///
/// `state` is the last fully committed loop state, with termination `Failed`.
#[derive(Debug)]
pub struct RunFailure<S> {
    /// What went wrong, with the stage and position
    pub error: Error,
    /// Last committed state
    pub state: LoopState<S>,
}

impl<S> RunFailure<S> {
    /// Discard the state
    pub fn into_error(self) -> Error {
        self.error
    }
}

impl<S> fmt::Display for RunFailure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run failed: {}", self.error)
    }
}

impl<S: fmt::Debug> std::error::Error for RunFailure<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl<S> From<RunFailure<S>> for Error {
    fn from(failure: RunFailure<S>) -> Self {
        failure.error
    }
}
