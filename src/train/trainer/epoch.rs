//! Epoch-level driver: one pass over the data source

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::train::batch::DataSource;
use crate::train::callback::ControlTerm;
use crate::train::event::{Event, Termination};
use crate::train::state::LoopState;
use crate::train::trainer::core::Loop;

/// How an epoch ended, as far as the outer loop is concerned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum EpochFlow {
    /// Move on to the next epoch
    Next,
    /// A handler asked to halt the whole run
    HaltLoop,
}

impl<B, S> Loop<B, S> {
    /// Run epoch `epoch` from `epoch_started` through `epoch_completed`/`epoch_halted`
    pub(super) fn run_epoch<D>(
        &mut self,
        epoch: usize,
        data: &mut D,
        state: &mut LoopState<S>,
    ) -> Result<EpochFlow>
    where
        D: DataSource<Batch = B>,
    {
        let epoch_start = state.position();
        state.begin_epoch(epoch);
        self.metrics.start_epoch(state.metrics_mut());

        let mut halted = match self.handlers.dispatch(Event::EpochStarted, state)? {
            ControlTerm::HaltLoop => return Ok(EpochFlow::HaltLoop),
            ControlTerm::HaltEpoch => true,
            ControlTerm::Continue => false,
        };

        if !halted {
            let cap = state.max_iterations().unwrap_or(usize::MAX);
            for batch in data.batches().take(cap) {
                state.begin_iteration();

                match self.handlers.dispatch(Event::IterationStarted, state)? {
                    ControlTerm::HaltLoop => return Ok(EpochFlow::HaltLoop),
                    ControlTerm::HaltEpoch => {
                        halted = true;
                        break;
                    }
                    ControlTerm::Continue => {}
                }

                if let Err(e) = self.commit_step(state, batch) {
                    state.rewind(epoch_start);
                    return Err(e);
                }
                trace!(epoch, iteration = state.iteration(), "step committed");

                match self.handlers.dispatch(Event::IterationCompleted, state)? {
                    ControlTerm::HaltLoop => return Ok(EpochFlow::HaltLoop),
                    ControlTerm::HaltEpoch => {
                        halted = true;
                        break;
                    }
                    ControlTerm::Continue => {}
                }
            }
        }

        let event = if halted {
            state.set_termination(Termination::HaltedEpoch);
            debug!(epoch, completed = state.completed_iterations(), "epoch halted");
            Event::EpochHalted
        } else {
            Event::EpochCompleted
        };

        // halt_epoch has nothing left to abort here
        match self.handlers.dispatch(event, state)? {
            ControlTerm::HaltLoop => Ok(EpochFlow::HaltLoop),
            ControlTerm::HaltEpoch | ControlTerm::Continue => Ok(EpochFlow::Next),
        }
    }

    /// Run the step function and fold every metric
    ///
    /// On failure the step state and metrics are left as they were before the
    /// batch. Counters are the caller's to rewind.
    fn commit_step(&mut self, state: &mut LoopState<S>, batch: B) -> Result<()> {
        let next = self.step.step(&state.step_state, batch).map_err(|source| Error::Step {
            epoch: state.epoch(),
            iteration: state.iteration(),
            source,
        })?;

        let previous = std::mem::replace(&mut state.step_state, next);
        if let Err(e) = self.metrics.update(state) {
            state.step_state = previous;
            return Err(e);
        }
        state.commit_iteration();
        Ok(())
    }
}
