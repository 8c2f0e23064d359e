//! Run and resume

use std::time::Instant;

use tracing::debug;

use crate::error::Result;
use crate::train::batch::DataSource;
use crate::train::callback::ControlTerm;
use crate::train::config::RunConfig;
use crate::train::event::{Event, Termination};
use crate::train::state::LoopState;
use crate::train::trainer::core::Loop;
use crate::train::trainer::epoch::EpochFlow;
use crate::train::trainer::result::{RunFailure, RunOutcome};

impl<B, S> Loop<B, S> {
    /// Run `config.epochs()` epochs starting from `initial`
    ///
    /// # Returns
    ///
    /// The final state once `completed` or `halted` has been dispatched, or a
    /// [`RunFailure`] carrying the error and the last committed state.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bucle::train::{Loop, Metric, RunConfig, RunningAverage};
    ///
    /// let mut training = Loop::from_fn(|_: &f64, x: f64| Ok(x))
    ///     .metric(Metric::new("mean", |x: &f64| Ok(*x), RunningAverage))
    ///     .unwrap();
    ///
    /// let outcome = training.run(vec![1.0, 2.0, 3.0], 0.0, &RunConfig::new(2).unwrap()).unwrap();
    /// assert_eq!(outcome.metric("mean"), Some(2.0));
    /// ```
    pub fn run<D>(
        &mut self,
        data: D,
        initial: S,
        config: &RunConfig,
    ) -> std::result::Result<RunOutcome<S>, RunFailure<S>>
    where
        D: DataSource<Batch = B>,
    {
        self.resume(data, LoopState::new(initial), config)
    }

    /// Continue a run from a previously returned or checkpointed state
    ///
    /// Epochs `state.epoch() + 1 ..= config.epochs()` are run and `started`
    /// is dispatched again. Metric values restart at their identity.
    pub fn resume<D>(
        &mut self,
        mut data: D,
        mut state: LoopState<S>,
        config: &RunConfig,
    ) -> std::result::Result<RunOutcome<S>, RunFailure<S>>
    where
        D: DataSource<Batch = B>,
    {
        let start = Instant::now();
        match self.drive(&mut data, &mut state, config) {
            Ok(()) => Ok(RunOutcome { state, elapsed_secs: start.elapsed().as_secs_f64() }),
            Err(error) => {
                debug!(%error, epoch = state.epoch(), iteration = state.iteration(), "run failed");
                state.set_termination(Termination::Failed);
                Err(RunFailure { error, state })
            }
        }
    }

    fn drive<D>(&mut self, data: &mut D, state: &mut LoopState<S>, config: &RunConfig) -> Result<()>
    where
        D: DataSource<Batch = B>,
    {
        self.handlers.reset_filters();
        let values = self.metrics.start_run();
        state.begin_run(config.epochs(), config.iterations(), values);

        let first = state.epoch() + 1;
        debug!(
            first_epoch = first,
            epochs = config.epochs(),
            iterations = ?config.iterations(),
            "run started"
        );

        // halt_epoch before the first epoch has nothing to abort
        if self.handlers.dispatch(Event::Started, state)? == ControlTerm::HaltLoop {
            return self.halt(state);
        }

        for epoch in first..=config.epochs() {
            if self.run_epoch(epoch, data, state)? == EpochFlow::HaltLoop {
                return self.halt(state);
            }
        }

        state.set_termination(Termination::Completed);
        debug!(epoch = state.epoch(), global_iteration = state.global_iteration(), "run completed");
        self.handlers.dispatch(Event::Completed, state)?;
        Ok(())
    }

    fn halt(&mut self, state: &mut LoopState<S>) -> Result<()> {
        state.set_termination(Termination::HaltedLoop);
        debug!(epoch = state.epoch(), iteration = state.iteration(), "run halted");
        self.handlers.dispatch(Event::Halted, state)?;
        Ok(())
    }
}
