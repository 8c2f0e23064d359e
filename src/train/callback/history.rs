//! Per-epoch metric history recorded by a handler

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use super::traits::{ControlTerm, Handler};
use crate::error::BoxError;
use crate::train::event::{Event, Termination};
use crate::train::state::LoopState;

/// Metric values at the end of one epoch
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// Epoch number
    pub epoch: usize,
    /// Steps committed in the epoch
    pub iterations: usize,
    /// Whether the epoch was halted early
    pub halted: bool,
    /// Metric aggregates at the end of the epoch
    pub metrics: BTreeMap<String, f64>,
}

/// Records one [`EpochRecord`] per `epoch_completed` or `epoch_halted`
///
/// Clones share the same history, so keep one clone to read back what the
/// registered one recorded.
#[derive(Clone, Debug, Default)]
pub struct MetricsHistory {
    records: Arc<Mutex<Vec<EpochRecord>>>,
}

impl MetricsHistory {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded epochs
    pub fn records(&self) -> Vec<EpochRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Values of `metric` in epoch order
    pub fn values(&self, metric: &str) -> Vec<f64> {
        self.records()
            .iter()
            .filter_map(|r| r.metrics.get(metric).copied())
            .collect()
    }

    /// Number of recorded epochs
    pub fn len(&self) -> usize {
        self.records.lock().map_or(0, |r| r.len())
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// History as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.records())
    }
}

impl<S> Handler<S> for MetricsHistory {
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError> {
        if !matches!(state.event(), Some(Event::EpochCompleted | Event::EpochHalted)) {
            return Ok(ControlTerm::Continue);
        }
        let record = EpochRecord {
            epoch: state.epoch(),
            iterations: state.completed_iterations(),
            halted: state.termination() == Termination::HaltedEpoch,
            metrics: state.metrics().to_map(),
        };
        self.records
            .lock()
            .map_err(|_| "metrics history lock poisoned")?
            .push(record);
        Ok(ControlTerm::Continue)
    }

    fn name(&self) -> &str {
        "MetricsHistory"
    }
}
