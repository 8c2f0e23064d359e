//! Event-driven training loop
//!
//! This module provides the loop engine with:
//! - Lifecycle events and control terms (continue, halt epoch, halt loop)
//! - Handlers gated by filters, dispatched in registration order
//! - Metrics folded by accumulators after every step
//! - A step contract and a conventional supervised step state
//! - Canonical handlers (checkpointing, early stopping, NaN guard,
//!   learning rate reduction, progress logging, metric history)
//!
//! # Example
//!
//! ```rust
//! use bucle::train::{
//!     supervised, Batch, EarlyStopping, Event, Filter, Loop, Metric, RunConfig, RunningAverage,
//!     StepOutput, TrainState,
//! };
//!
//! let batches = vec![
//!     Batch::new(vec![1.0, 2.0], vec![2.0, 4.0]).unwrap(),
//!     Batch::new(vec![3.0], vec![6.0]).unwrap(),
//! ];
//!
//! let step = supervised(|w: &f64, lr: &f64, batch: &Batch| {
//!     let predictions: Vec<f64> = batch.inputs.iter().map(|x| w * x).collect();
//!     let n = batch.size() as f64;
//!     let grad = predictions.iter().zip(&batch.inputs).zip(&batch.targets)
//!         .map(|((p, x), t)| 2.0 * (p - t) * x)
//!         .sum::<f64>() / n;
//!     let loss = predictions.iter().zip(&batch.targets)
//!         .map(|(p, t)| (p - t).powi(2))
//!         .sum::<f64>() / n;
//!     Ok(StepOutput { params: w - lr * grad, optimizer: *lr, loss, predictions })
//! });
//!
//! let mut training = Loop::new(step)
//!     .metric(Metric::new("loss", |s: &TrainState<f64, f64>| Ok(s.loss), RunningAverage))
//!     .unwrap()
//!     .on(Event::EpochCompleted, Filter::always(), EarlyStopping::new("loss", 3));
//!
//! let outcome = training
//!     .run(batches, TrainState::new(0.0, 0.02), &RunConfig::new(50).unwrap())
//!     .unwrap();
//! assert!((outcome.state.step_state.params - 2.0).abs() < 0.1);
//! ```

mod batch;
pub mod callback;
mod config;
mod event;
pub mod metrics;
mod state;
mod step;
mod trainer;

pub use batch::{from_fn, Batch, DataSource, FromFn};
pub use callback::{
    format_metrics, handler_fn, Checkpoint, ControlTerm, EarlyStopping, EpochRecord, Filter,
    FnHandler, Handler, HandlerRegistry, MetricsHistory, Mode, ProgressLogger, ReduceLrOnPlateau,
    TerminateOnNan,
};
pub use config::RunConfig;
pub use event::{Event, Termination};
pub use metrics::{
    accumulator_fn, Accumulator, ExponentialMovingAverage, FnAccumulator, Metric, ResetPolicy,
    RunningAverage, RunningMax, RunningMin, RunningSum,
};
pub use state::{LoopState, MetricValues};
pub use step::{
    step_fn, supervised, LearningRate, Step, StepFn, StepOutput, SupervisedStep, TrainState,
};
pub use trainer::{Loop, RunFailure, RunOutcome};
