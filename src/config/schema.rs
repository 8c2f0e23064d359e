//! YAML schema for `bucle fit`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::train::RunConfig;

/// Complete fit configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FitSpec {
    /// Epoch budget and iteration cap
    #[serde(default)]
    pub run: RunConfig,

    /// Synthetic dataset
    #[serde(default)]
    pub data: DataSpec,

    /// Optimizer settings
    #[serde(default)]
    pub optimizer: OptimizerSpec,

    /// Checkpointing (disabled when absent)
    #[serde(default)]
    pub checkpoint: Option<CheckpointSpec>,

    /// Early stopping on the epoch loss (disabled when absent)
    #[serde(default)]
    pub early_stopping: Option<EarlyStoppingSpec>,

    /// Progress logging
    #[serde(default)]
    pub logging: LoggingSpec,
}

/// Synthetic `y = slope * x + intercept` data on an even grid over [-1, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSpec {
    /// Number of samples
    #[serde(default = "default_samples")]
    pub samples: usize,

    /// Samples per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// True slope
    #[serde(default = "default_slope")]
    pub slope: f64,

    /// True intercept
    #[serde(default = "default_intercept")]
    pub intercept: f64,
}

fn default_samples() -> usize {
    256
}

fn default_batch_size() -> usize {
    16
}

fn default_slope() -> f64 {
    2.0
}

fn default_intercept() -> f64 {
    -1.0
}

impl Default for DataSpec {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            batch_size: default_batch_size(),
            slope: default_slope(),
            intercept: default_intercept(),
        }
    }
}

/// Plain SGD settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptimizerSpec {
    /// Learning rate
    #[serde(default = "default_lr")]
    pub lr: f64,

    /// Reduce the learning rate when the epoch loss plateaus
    #[serde(default)]
    pub plateau: Option<PlateauSpec>,
}

fn default_lr() -> f64 {
    0.1
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self { lr: default_lr(), plateau: None }
    }
}

/// Learning rate reduction on plateau
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlateauSpec {
    /// Multiplier applied on a plateau, in (0, 1)
    #[serde(default = "default_factor")]
    pub factor: f64,

    /// Epochs without improvement before reducing
    #[serde(default = "default_plateau_patience")]
    pub patience: usize,

    /// Lower bound on the learning rate
    #[serde(default)]
    pub min_lr: f64,
}

fn default_factor() -> f64 {
    0.5
}

fn default_plateau_patience() -> usize {
    2
}

/// Checkpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointSpec {
    /// Directory receiving one JSON file per checkpoint
    pub dir: PathBuf,

    /// Save every N epochs
    #[serde(default = "default_every")]
    pub every: usize,

    /// Only save when the epoch loss improves
    #[serde(default)]
    pub save_best: bool,
}

/// Early stopping settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EarlyStoppingSpec {
    /// Epochs without improvement tolerated
    #[serde(default = "default_patience")]
    pub patience: usize,

    /// Minimum loss decrease counted as improvement
    #[serde(default)]
    pub min_delta: f64,
}

fn default_patience() -> usize {
    5
}

/// Progress logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSpec {
    /// Log every N epochs
    #[serde(default = "default_every")]
    pub every: usize,

    /// Write the per-epoch metric history to this JSON file
    #[serde(default)]
    pub history: Option<PathBuf>,
}

fn default_every() -> usize {
    1
}

impl Default for LoggingSpec {
    fn default() -> Self {
        Self { every: default_every(), history: None }
    }
}
