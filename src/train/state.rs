//! Loop state threaded through a run

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::event::{Event, Termination};

/// Ordered metric name -> aggregate mapping with keys fixed at construction
///
/// Handlers may read and overwrite values, but never add or remove keys.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    entries: Vec<(String, f64)>,
}

impl MetricValues {
    pub(crate) fn new(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    /// Current aggregate for `name`
    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Overwrite the aggregate for an existing metric
    ///
    /// Returns `false` (and changes nothing) if `name` is not a metric of this loop.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn value_at(&self, index: usize) -> Option<f64> {
        self.entries.get(index).map(|(_, v)| *v)
    }

    pub(crate) fn set_at(&mut self, index: usize, value: f64) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.1 = value;
        }
    }

    /// Iterate metrics in definition order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    /// Metric names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of metrics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the loop defines no metrics
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot as a sorted map
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.entries.iter().cloned().collect()
    }
}

/// Counters and metrics of the last committed step
#[derive(Clone, Debug)]
pub(crate) struct Position {
    epoch: usize,
    iteration: usize,
    completed_iterations: usize,
    global_iteration: usize,
    metrics: MetricValues,
}

/// The single mutable record threaded through a run
///
/// Counters are read-only outside the driver. `step_state` is owned by the
/// driver; handlers receive `&mut LoopState` only for the duration of their
/// invocation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopState<S> {
    epoch: usize,
    iteration: usize,
    #[serde(default)]
    completed_iterations: usize,
    global_iteration: usize,
    max_epochs: usize,
    max_iterations: Option<usize>,
    /// State owned by the step function (parameters, optimizer state, last batch outputs)
    pub step_state: S,
    metrics: MetricValues,
    #[serde(default)]
    event: Option<Event>,
    #[serde(default)]
    termination: Termination,
}

impl<S> LoopState<S> {
    /// Fresh state before the first epoch
    pub fn new(step_state: S) -> Self {
        Self::at_epoch(step_state, 0)
    }

    /// State positioned after `epoch` completed epochs, for resuming a run
    pub fn at_epoch(step_state: S, epoch: usize) -> Self {
        Self {
            epoch,
            iteration: 0,
            completed_iterations: 0,
            global_iteration: 0,
            max_epochs: 0,
            max_iterations: None,
            step_state,
            metrics: MetricValues::default(),
            event: None,
            termination: Termination::Running,
        }
    }

    /// Current epoch (1-based; 0 before the first epoch starts)
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Current iteration within the epoch (1-based; 0 before the first batch)
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Steps committed in the current epoch
    ///
    /// Differs from [`LoopState::iteration`] only while a batch is in flight,
    /// or when `iteration_started` halted the epoch before its step ran.
    pub fn completed_iterations(&self) -> usize {
        self.completed_iterations
    }

    /// Batches pulled so far in this run
    pub fn global_iteration(&self) -> usize {
        self.global_iteration
    }

    /// Epoch budget of the current run
    pub fn max_epochs(&self) -> usize {
        self.max_epochs
    }

    /// Per-epoch iteration cap of the current run, if any
    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    /// Current metric aggregates
    pub fn metrics(&self) -> &MetricValues {
        &self.metrics
    }

    /// Overwrite the aggregate of an existing metric
    ///
    /// Returns `false` if `name` is not a metric of this loop.
    pub fn set_metric(&mut self, name: &str, value: f64) -> bool {
        self.metrics.set(name, value)
    }

    /// Shortcut for `self.metrics().get(name)`
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name)
    }

    /// Event currently being dispatched, or the last one dispatched
    pub fn event(&self) -> Option<Event> {
        self.event
    }

    /// Position in the halt state machine
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Consume the state, returning the step state
    pub fn into_step_state(self) -> S {
        self.step_state
    }

    pub(crate) fn begin_run(
        &mut self,
        max_epochs: usize,
        max_iterations: Option<usize>,
        metrics: MetricValues,
    ) {
        self.max_epochs = max_epochs;
        self.max_iterations = max_iterations;
        self.iteration = 0;
        self.completed_iterations = 0;
        self.global_iteration = 0;
        self.metrics = metrics;
        self.event = None;
        self.termination = Termination::Running;
    }

    pub(crate) fn begin_epoch(&mut self, epoch: usize) {
        debug_assert!(epoch > self.epoch);
        self.epoch = epoch;
        self.iteration = 0;
        self.completed_iterations = 0;
        self.termination = Termination::Running;
    }

    pub(crate) fn begin_iteration(&mut self) {
        self.iteration += 1;
        self.global_iteration += 1;
    }

    pub(crate) fn commit_iteration(&mut self) {
        self.completed_iterations = self.iteration;
    }

    /// Position of the last committed step, taken before an epoch starts
    pub(crate) fn position(&self) -> Position {
        Position {
            epoch: self.epoch,
            iteration: self.iteration,
            completed_iterations: self.completed_iterations,
            global_iteration: self.global_iteration,
            metrics: self.metrics.clone(),
        }
    }

    /// Move the counters back to the last committed step
    ///
    /// If nothing was committed in the current epoch, the state returns to
    /// `epoch_start`, metrics included, so a resumed run repeats the epoch.
    pub(crate) fn rewind(&mut self, epoch_start: Position) {
        if self.completed_iterations == 0 {
            self.epoch = epoch_start.epoch;
            self.iteration = epoch_start.iteration;
            self.completed_iterations = epoch_start.completed_iterations;
            self.global_iteration = epoch_start.global_iteration;
            self.metrics = epoch_start.metrics;
        } else {
            self.global_iteration -= self.iteration - self.completed_iterations;
            self.iteration = self.completed_iterations;
        }
    }

    pub(crate) fn set_event(&mut self, event: Event) {
        self.event = Some(event);
    }

    pub(crate) fn metrics_mut(&mut self) -> &mut MetricValues {
        &mut self.metrics
    }

    pub(crate) fn set_termination(&mut self, termination: Termination) {
        self.termination = termination;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> MetricValues {
        MetricValues::new(vec![("loss".to_string(), 0.5), ("acc".to_string(), 0.9)])
    }

    #[test]
    fn test_metric_values_keep_definition_order() {
        let names: Vec<_> = values().names().map(str::to_string).collect();
        assert_eq!(names, vec!["loss", "acc"]);
    }

    #[test]
    fn test_metric_values_set_existing_only() {
        let mut m = values();
        assert!(m.set("loss", 0.25));
        assert_eq!(m.get("loss"), Some(0.25));
        assert!(!m.set("f1", 1.0));
        assert_eq!(m.len(), 2);
        assert!(m.get("f1").is_none());
    }

    #[test]
    fn test_new_state_is_before_first_epoch() {
        let state = LoopState::new(42u32);
        assert_eq!(state.epoch(), 0);
        assert_eq!(state.iteration(), 0);
        assert_eq!(state.termination(), Termination::Running);
        assert!(state.event().is_none());
        assert!(state.metrics().is_empty());
        assert_eq!(state.into_step_state(), 42);
    }

    #[test]
    fn test_epoch_boundary_resets_iteration() {
        let mut state = LoopState::new(());
        state.begin_run(3, None, values());
        state.begin_epoch(1);
        state.begin_iteration();
        state.begin_iteration();
        assert_eq!(state.iteration(), 2);
        state.set_termination(Termination::HaltedEpoch);

        state.begin_epoch(2);
        assert_eq!(state.iteration(), 0);
        assert_eq!(state.global_iteration(), 2);
        assert_eq!(state.termination(), Termination::Running);
    }

    #[test]
    fn test_rewind_drops_uncommitted_batch() {
        let mut state = LoopState::new(());
        state.begin_run(3, None, values());
        state.begin_epoch(1);
        let epoch_start = state.position();
        state.begin_iteration();
        state.commit_iteration();
        state.begin_iteration();

        state.rewind(epoch_start);
        assert_eq!((state.epoch(), state.iteration()), (1, 1));
        assert_eq!(state.completed_iterations(), 1);
        assert_eq!(state.global_iteration(), 1);
    }

    #[test]
    fn test_rewind_before_first_commit_returns_to_previous_epoch() {
        let mut state = LoopState::new(());
        state.begin_run(3, None, values());
        state.begin_epoch(1);
        state.begin_iteration();
        state.commit_iteration();
        state.set_metric("loss", 0.1);

        let epoch_start = state.position();
        state.begin_epoch(2);
        state.set_metric("loss", 0.0);
        state.begin_iteration();

        state.rewind(epoch_start);
        assert_eq!((state.epoch(), state.iteration()), (1, 1));
        assert_eq!(state.global_iteration(), 1);
        assert_eq!(state.metric("loss"), Some(0.1));
    }

    #[test]
    fn test_at_epoch_positions_resume() {
        let state = LoopState::at_epoch("params", 4);
        assert_eq!(state.epoch(), 4);
        assert_eq!(state.step_state, "params");
    }

    #[test]
    fn test_state_serde_roundtrip() {
        let mut state = LoopState::new(vec![1.0f64, 2.0]);
        state.begin_run(2, Some(10), values());
        state.set_event(Event::EpochCompleted);
        let json = serde_json::to_string(&state).unwrap();
        let back: LoopState<Vec<f64>> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_iterations(), Some(10));
        assert_eq!(back.event(), Some(Event::EpochCompleted));
        assert_eq!(back.metrics(), state.metrics());
    }
}
