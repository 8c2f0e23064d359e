//! Lifecycle events and run termination states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle event fired by the loop driver
///
/// Events are listed in lifecycle order. Exactly one of [`Event::Completed`]
/// or [`Event::Halted`] fires per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// Fired once before the first epoch
    Started,
    /// Fired at the start of every epoch, after metrics are reset
    EpochStarted,
    /// Fired before the step function runs for a batch
    IterationStarted,
    /// Fired after the step function and metric updates for a batch
    IterationCompleted,
    /// Fired when an epoch finishes without a halt request
    EpochCompleted,
    /// Fired instead of `EpochCompleted` when a handler requested `HaltEpoch`
    EpochHalted,
    /// Terminal event after a `HaltLoop` request
    Halted,
    /// Terminal event after all epochs ran
    Completed,
}

impl Event {
    /// All events in lifecycle order
    pub const ALL: [Event; 8] = [
        Event::Started,
        Event::EpochStarted,
        Event::IterationStarted,
        Event::IterationCompleted,
        Event::EpochCompleted,
        Event::EpochHalted,
        Event::Halted,
        Event::Completed,
    ];

    /// Snake-case name used in logs and serialized records
    pub fn as_str(self) -> &'static str {
        match self {
            Event::Started => "started",
            Event::EpochStarted => "epoch_started",
            Event::IterationStarted => "iteration_started",
            Event::IterationCompleted => "iteration_completed",
            Event::EpochCompleted => "epoch_completed",
            Event::EpochHalted => "epoch_halted",
            Event::Halted => "halted",
            Event::Completed => "completed",
        }
    }

    /// Whether this event ends the run
    pub fn is_terminal(self) -> bool {
        matches!(self, Event::Halted | Event::Completed)
    }

    /// Whether this event fires once per iteration
    pub fn is_iteration_event(self) -> bool {
        matches!(self, Event::IterationStarted | Event::IterationCompleted)
    }

    /// Whether this event fires once per epoch
    pub fn is_epoch_event(self) -> bool {
        matches!(self, Event::EpochStarted | Event::EpochCompleted | Event::EpochHalted)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a run is in its halt state machine
///
/// `HaltedEpoch` returns to `Running` at the next epoch start. `HaltedLoop`,
/// `Completed` and `Failed` are absorbing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// The loop is running normally
    #[default]
    Running,
    /// The current epoch was aborted by a handler
    HaltedEpoch,
    /// The whole run was aborted by a handler
    HaltedLoop,
    /// All epochs ran
    Completed,
    /// A step, metric or handler raised an error
    Failed,
}

impl Termination {
    /// Whether no further epochs can start from this state
    pub fn is_final(self) -> bool {
        matches!(self, Termination::HaltedLoop | Termination::Completed | Termination::Failed)
    }
}
