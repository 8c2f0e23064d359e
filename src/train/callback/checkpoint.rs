//! Checkpoint handler persisting the step state to a [`CheckpointStore`]

use serde::Serialize;
use tracing::debug;

use super::monitor::{MetricMonitor, Mode};
use super::traits::{ControlTerm, Handler};
use crate::error::BoxError;
use crate::storage::{CheckpointKey, CheckpointRecord, CheckpointStore};
use crate::train::state::LoopState;

type ProjectFn<S> = Box<dyn Fn(&S) -> Result<serde_json::Value, BoxError> + Send>;

/// Saves a projection of the step state whenever it fires
///
/// Records are keyed by the epoch and the number of steps committed in it,
/// and carry the metric values at the time of saving. Use a filter to control
/// the cadence, or [`Checkpoint::save_best`] to save only on improvement.
///
/// # Example
///
/// ```rust
/// use bucle::storage::MemoryStore;
/// use bucle::train::{Checkpoint, Event, Filter, Loop};
///
/// let store = MemoryStore::new();
/// let mut training = Loop::from_fn(|w: &Vec<f64>, x: f64| Ok(vec![w[0] + x]));
/// training.handle(
///     Event::EpochCompleted,
///     Filter::every(5).unwrap(),
///     Checkpoint::serialize(store.clone(), |w: &Vec<f64>| w),
/// );
/// ```
pub struct Checkpoint<S, St> {
    store: St,
    project: ProjectFn<S>,
    best: Option<MetricMonitor>,
    last_saved: Option<CheckpointKey>,
}

impl<S, St: CheckpointStore> Checkpoint<S, St> {
    /// Save whatever JSON `project` produces from the step state
    pub fn new<F>(store: St, project: F) -> Self
    where
        F: Fn(&S) -> Result<serde_json::Value, BoxError> + Send + 'static,
    {
        Self { store, project: Box::new(project), best: None, last_saved: None }
    }

    /// Save the serialized part of the step state selected by `project`
    pub fn serialize<T, F>(store: St, project: F) -> Self
    where
        T: Serialize + ?Sized,
        F: Fn(&S) -> &T + Send + 'static,
    {
        Self::new(store, move |state: &S| Ok(serde_json::to_value(project(state))?))
    }

    /// Only save when `metric` improves in the direction of `mode`
    pub fn save_best(mut self, metric: impl Into<String>, mode: Mode) -> Self {
        let mut monitor = MetricMonitor::new(metric);
        monitor.set_mode(mode);
        self.best = Some(monitor);
        self
    }

    /// Key of the most recent save
    pub fn last_saved(&self) -> Option<CheckpointKey> {
        self.last_saved
    }

    /// Underlying store
    pub fn store(&self) -> &St {
        &self.store
    }
}

impl<S, St: CheckpointStore> Handler<S> for Checkpoint<S, St> {
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError> {
        if let Some(monitor) = self.best.as_mut() {
            let value = monitor.read(state)?;
            if !monitor.observe(value) {
                return Ok(ControlTerm::Continue);
            }
        }

        let key = CheckpointKey::new(state.epoch(), state.completed_iterations());
        let payload = (self.project)(&state.step_state)?;
        let record = CheckpointRecord::new(key, state.metrics(), payload);
        self.store.save(&record)?;
        self.last_saved = Some(key);

        debug!(%key, backend = self.store.backend_type(), "checkpoint saved");
        Ok(ControlTerm::Continue)
    }

    fn name(&self) -> &str {
        "Checkpoint"
    }
}
