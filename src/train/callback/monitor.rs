//! Metric monitoring shared by the stopping and scheduling handlers, plus
//! the non-finite metric guard

use tracing::warn;

use super::traits::{ControlTerm, Handler};
use crate::error::BoxError;
use crate::train::state::LoopState;

/// Direction in which a monitored metric improves
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Lower is better (losses)
    #[default]
    Min,
    /// Higher is better (accuracies)
    Max,
}

/// Tracks the best value of one metric and how long ago it was seen
#[derive(Clone, Debug)]
pub(crate) struct MetricMonitor {
    metric: String,
    mode: Mode,
    min_delta: f64,
    best: Option<f64>,
    pub(crate) since_best: usize,
}

impl MetricMonitor {
    pub(crate) fn new(metric: impl Into<String>) -> Self {
        Self { metric: metric.into(), mode: Mode::Min, min_delta: 0.0, best: None, since_best: 0 }
    }

    pub(crate) fn metric(&self) -> &str {
        &self.metric
    }

    pub(crate) fn best(&self) -> Option<f64> {
        self.best
    }

    pub(crate) fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub(crate) fn set_min_delta(&mut self, min_delta: f64) {
        self.min_delta = min_delta.abs();
    }

    pub(crate) fn reset(&mut self) {
        self.best = None;
        self.since_best = 0;
    }

    /// Read the monitored metric from `state`
    pub(crate) fn read<S>(&self, state: &LoopState<S>) -> Result<f64, BoxError> {
        state
            .metric(&self.metric)
            .ok_or_else(|| format!("unknown metric '{}'", self.metric).into())
    }

    /// Record `value`; returns whether it improved on the best so far
    ///
    /// NaN never counts as an improvement.
    pub(crate) fn observe(&mut self, value: f64) -> bool {
        let improved = match (self.best, self.mode) {
            _ if value.is_nan() => false,
            (None, _) => true,
            (Some(best), Mode::Min) => value < best - self.min_delta,
            (Some(best), Mode::Max) => value > best + self.min_delta,
        };
        if improved {
            self.best = Some(value);
            self.since_best = 0;
        } else {
            self.since_best += 1;
        }
        improved
    }
}

/// Halt the run as soon as a metric becomes NaN or infinite
///
/// # Example
///
/// ```rust
/// use bucle::train::{Event, Filter, Loop, TerminateOnNan};
///
/// let mut training = Loop::from_fn(|s: &f64, b: f64| Ok(s + b));
/// training.handle(Event::IterationCompleted, Filter::always(), TerminateOnNan::new("loss"));
/// ```
#[derive(Clone, Debug)]
pub struct TerminateOnNan {
    metric: String,
}

impl TerminateOnNan {
    /// Guard the metric named `metric`
    pub fn new(metric: impl Into<String>) -> Self {
        Self { metric: metric.into() }
    }
}

impl<S> Handler<S> for TerminateOnNan {
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError> {
        let value = state
            .metric(&self.metric)
            .ok_or_else(|| format!("unknown metric '{}'", self.metric))?;
        if value.is_finite() {
            return Ok(ControlTerm::Continue);
        }
        warn!(
            metric = %self.metric,
            value,
            epoch = state.epoch(),
            iteration = state.iteration(),
            "non-finite metric, halting run"
        );
        Ok(ControlTerm::HaltLoop)
    }

    fn name(&self) -> &str {
        "TerminateOnNan"
    }
}
