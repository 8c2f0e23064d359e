//! Checkpoint keys and records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::train::MetricValues;

/// Position in a run at which a checkpoint was taken
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CheckpointKey {
    /// Epoch (1-based)
    pub epoch: usize,
    /// Iteration within the epoch
    pub iteration: usize,
}

impl CheckpointKey {
    /// Create a key
    pub fn new(epoch: usize, iteration: usize) -> Self {
        Self { epoch, iteration }
    }

    /// File name used by [`super::FileStore`]
    pub fn file_name(&self) -> String {
        format!("checkpoint_epoch_{}_iter_{}.json", self.epoch, self.iteration)
    }

    /// Parse a file name produced by [`CheckpointKey::file_name`]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let rest = name.strip_prefix("checkpoint_epoch_")?.strip_suffix(".json")?;
        let (epoch, iteration) = rest.split_once("_iter_")?;
        Some(Self { epoch: epoch.parse().ok()?, iteration: iteration.parse().ok()? })
    }
}

impl fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch {} iteration {}", self.epoch, self.iteration)
    }
}

/// A persisted checkpoint
///
/// Non-finite metric values are stored as `None` since JSON has no NaN.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Where in the run the checkpoint was taken
    pub key: CheckpointKey,
    /// Wall-clock save time
    pub saved_at: DateTime<Utc>,
    /// Metric values at save time
    pub metrics: BTreeMap<String, Option<f64>>,
    /// Serialized durable portion of the step state
    pub payload: serde_json::Value,
}

impl CheckpointRecord {
    /// Build a record stamped with the current time
    pub fn new(key: CheckpointKey, metrics: &MetricValues, payload: serde_json::Value) -> Self {
        Self {
            key,
            saved_at: Utc::now(),
            metrics: metrics
                .iter()
                .map(|(name, v)| (name.to_string(), v.is_finite().then_some(v)))
                .collect(),
            payload,
        }
    }

    /// Deserialize the payload
    pub fn payload_as<T>(&self) -> crate::Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        Ok(T::deserialize(&self.payload)?)
    }
}
