//! Error types with actionable diagnostics.
//!
//! Configuration problems are rejected before a run starts. Failures raised
//! by user code during a run (step function, metric extraction, handlers)
//! carry the lifecycle stage and the epoch/iteration at which they happened.

use std::path::PathBuf;
use thiserror::Error;

use crate::train::Event;

/// Boxed error returned by user-supplied step functions, extractors and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for bucle operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running a loop.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value was rejected at construction time.
    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// A configuration file could not be parsed.
    #[error("Invalid configuration syntax in {}:\n  {message}\n  → Check YAML syntax at the indicated line", .path.display())]
    ConfigParse { path: PathBuf, message: String },

    /// Inputs and targets of a batch disagree on their leading dimension.
    #[error("Batch shape mismatch: {inputs} inputs vs {targets} targets\n  → Inputs and targets must have the same number of rows")]
    BatchShape { inputs: usize, targets: usize },

    /// The step function failed.
    #[error("Step function failed at epoch {epoch}, iteration {iteration}: {source}")]
    Step {
        epoch: usize,
        iteration: usize,
        #[source]
        source: BoxError,
    },

    /// A metric extraction function failed.
    #[error("Metric '{metric}' failed at epoch {epoch}, iteration {iteration}: {source}")]
    Metric {
        metric: String,
        epoch: usize,
        iteration: usize,
        #[source]
        source: BoxError,
    },

    /// A handler failed while an event was being dispatched.
    #[error("Handler '{handler}' failed during {event} at epoch {epoch}, iteration {iteration}: {source}")]
    Handler {
        event: Event,
        handler: String,
        epoch: usize,
        iteration: usize,
        #[source]
        source: BoxError,
    },

    /// No checkpoint exists for the requested key.
    #[error("Checkpoint not found: {0}\n  → List available checkpoints with CheckpointStore::keys")]
    CheckpointNotFound(String),

    /// A checkpoint store could not complete an operation.
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error with context.
    #[error("IO error: {context}\n  Cause: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error for `field`.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig { field: field.into(), message: message.into() }
    }

    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Whether the error was raised before any run started.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. } | Self::ConfigParse { .. })
    }

    /// Epoch and iteration at which a run failed, if this is a run failure.
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            Self::Step { epoch, iteration, .. }
            | Self::Metric { epoch, iteration, .. }
            | Self::Handler { epoch, iteration, .. } => Some((*epoch, *iteration)),
            _ => None,
        }
    }
}
