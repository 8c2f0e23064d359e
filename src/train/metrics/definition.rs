//! Metric definitions and the per-loop metric set

use std::collections::HashSet;

use super::accumulator::Accumulator;
use crate::error::{BoxError, Error, Result};
use crate::train::state::{LoopState, MetricValues};

/// When a metric's aggregate returns to its accumulator identity
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResetPolicy {
    /// Reset at every `epoch_started`
    #[default]
    PerEpoch,
    /// Reset only when a run starts
    PerRun,
}

type ExtractFn<S> = Box<dyn Fn(&S) -> std::result::Result<f64, BoxError> + Send>;

/// A named pairing of an extraction function and an accumulator
///
/// # Example
///
/// ```rust
/// use bucle::train::{Metric, RunningAverage};
///
/// struct Step { loss: f64 }
///
/// let loss = Metric::new("loss", |s: &Step| Ok(s.loss), RunningAverage);
/// assert_eq!(loss.name(), "loss");
/// ```
pub struct Metric<S> {
    name: String,
    extract: ExtractFn<S>,
    accumulator: Box<dyn Accumulator>,
    reset: ResetPolicy,
}

impl<S> Metric<S> {
    /// Define a metric with the default per-epoch reset policy
    pub fn new<F, A>(name: impl Into<String>, extract: F, accumulator: A) -> Self
    where
        F: Fn(&S) -> std::result::Result<f64, BoxError> + Send + 'static,
        A: Accumulator + 'static,
    {
        Self {
            name: name.into(),
            extract: Box::new(extract),
            accumulator: Box::new(accumulator),
            reset: ResetPolicy::PerEpoch,
        }
    }

    /// Change the reset policy
    pub fn with_reset_policy(mut self, reset: ResetPolicy) -> Self {
        self.reset = reset;
        self
    }

    /// Metric name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reset policy
    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset
    }

    /// Identity of the underlying accumulator
    pub fn identity(&self) -> f64 {
        self.accumulator.identity()
    }
}

impl<S> std::fmt::Debug for Metric<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metric")
            .field("name", &self.name)
            .field("accumulator", &self.accumulator.name())
            .field("reset", &self.reset)
            .finish()
    }
}

/// Metrics of one loop plus the observation count since each metric's last reset
pub(crate) struct MetricSet<S> {
    metrics: Vec<Metric<S>>,
    observed: Vec<usize>,
}

impl<S> MetricSet<S> {
    pub(crate) fn new() -> Self {
        Self { metrics: Vec::new(), observed: Vec::new() }
    }

    /// Add a metric, rejecting duplicate names
    pub(crate) fn push(&mut self, metric: Metric<S>) -> Result<()> {
        if metric.name.is_empty() {
            return Err(Error::config("metric", "name must not be empty"));
        }
        let names: HashSet<&str> = self.metrics.iter().map(|m| m.name.as_str()).collect();
        if names.contains(metric.name.as_str()) {
            return Err(Error::config(
                "metric",
                format!("'{}' is defined more than once", metric.name),
            ));
        }
        self.metrics.push(metric);
        self.observed.push(0);
        Ok(())
    }

    pub(crate) fn names(&self) -> Vec<&str> {
        self.metrics.iter().map(|m| m.name.as_str()).collect()
    }

    /// Values at accumulator identity, and restart every count
    pub(crate) fn start_run(&mut self) -> MetricValues {
        self.observed.iter_mut().for_each(|n| *n = 0);
        MetricValues::new(
            self.metrics.iter().map(|m| (m.name.clone(), m.identity())).collect(),
        )
    }

    /// Reset per-epoch metrics to identity
    pub(crate) fn start_epoch(&mut self, values: &mut MetricValues) {
        for (i, metric) in self.metrics.iter().enumerate() {
            if metric.reset == ResetPolicy::PerEpoch {
                self.observed[i] = 0;
                values.set_at(i, metric.identity());
            }
        }
    }

    /// Fold the current step state into every metric
    ///
    /// All observations are extracted before any aggregate is written, so a
    /// failing extractor leaves the metric values untouched.
    pub(crate) fn update(&mut self, state: &mut LoopState<S>) -> Result<()> {
        let mut next = Vec::with_capacity(self.metrics.len());
        for (i, metric) in self.metrics.iter().enumerate() {
            let observation = (metric.extract)(&state.step_state).map_err(|source| {
                Error::Metric {
                    metric: metric.name.clone(),
                    epoch: state.epoch(),
                    iteration: state.iteration(),
                    source,
                }
            })?;
            let current = state.metrics().value_at(i).unwrap_or_else(|| metric.identity());
            next.push(metric.accumulator.accumulate(current, observation, self.observed[i]));
        }

        for (i, value) in next.into_iter().enumerate() {
            state.metrics_mut().set_at(i, value);
            self.observed[i] += 1;
        }
        Ok(())
    }
}
