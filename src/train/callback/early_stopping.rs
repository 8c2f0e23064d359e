//! Early stopping handler to halt a run when a metric plateaus

use tracing::info;

use super::monitor::{MetricMonitor, Mode};
use super::traits::{ControlTerm, Handler};
use crate::error::BoxError;
use crate::train::state::LoopState;

/// Halt the run when a metric has not improved for `patience` firings
///
/// Usually registered on `epoch_completed`, so patience counts epochs.
///
/// # Example
///
/// ```rust
/// use bucle::train::{EarlyStopping, Mode};
///
/// // Stop if accuracy has not improved by 0.01 for 5 epochs
/// let early_stop = EarlyStopping::new("accuracy", 5).mode(Mode::Max).min_delta(0.01);
/// assert_eq!(early_stop.patience(), 5);
/// ```
#[derive(Clone, Debug)]
pub struct EarlyStopping {
    monitor: MetricMonitor,
    patience: usize,
}

impl EarlyStopping {
    /// Monitor `metric` (lower is better) with the given patience
    pub fn new(metric: impl Into<String>, patience: usize) -> Self {
        Self { monitor: MetricMonitor::new(metric), patience: patience.max(1) }
    }

    /// Set the direction of improvement
    pub fn mode(mut self, mode: Mode) -> Self {
        self.monitor.set_mode(mode);
        self
    }

    /// Minimum change that counts as an improvement
    pub fn min_delta(mut self, min_delta: f64) -> Self {
        self.monitor.set_min_delta(min_delta);
        self
    }

    /// Firings without improvement tolerated before halting
    pub fn patience(&self) -> usize {
        self.patience
    }

    /// Best value seen so far
    pub fn best(&self) -> Option<f64> {
        self.monitor.best()
    }

    /// Forget the best value and the patience counter
    pub fn reset(&mut self) {
        self.monitor.reset();
    }
}

impl<S> Handler<S> for EarlyStopping {
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError> {
        let value = self.monitor.read(state)?;
        self.monitor.observe(value);

        if self.monitor.since_best >= self.patience {
            info!(
                metric = self.monitor.metric(),
                patience = self.patience,
                best = ?self.monitor.best(),
                epoch = state.epoch(),
                "early stopping: no improvement"
            );
            Ok(ControlTerm::HaltLoop)
        } else {
            Ok(ControlTerm::Continue)
        }
    }

    fn name(&self) -> &str {
        "EarlyStopping"
    }
}
