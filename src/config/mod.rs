//! Declarative fit configuration
//!
//! The `bucle fit` command reads a YAML file describing the run budget, the
//! synthetic dataset, the optimizer and the handlers to attach:
//!
//! ```yaml
//! run:
//!   epochs: 20
//! data:
//!   samples: 256
//!   batch_size: 16
//!   slope: 2.0
//!   intercept: -1.0
//! optimizer:
//!   lr: 0.1
//! checkpoint:
//!   dir: ./checkpoints
//!   every: 5
//! early_stopping:
//!   patience: 3
//! ```

mod cli;
mod loader;
mod schema;
mod validate;

pub use cli::{apply_overrides, parse_args, Cli, Command, FitArgs, ValidateArgs};
pub use loader::{load_config, parse_config};
pub use schema::{
    CheckpointSpec, DataSpec, EarlyStoppingSpec, FitSpec, LoggingSpec, OptimizerSpec, PlateauSpec,
};
pub use validate::validate_spec;
