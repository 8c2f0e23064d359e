//! Metric accumulation for training loops
//!
//! A metric pairs an extraction function (step state -> scalar observation)
//! with an [`Accumulator`] folding observations into one aggregate. The loop
//! folds every metric after each step, before `iteration_completed` handlers
//! run, and resets per-epoch metrics at `epoch_started`.
//!
//! Built-in accumulators:
//! - [`RunningAverage`], [`RunningSum`]
//! - [`ExponentialMovingAverage`]
//! - [`RunningMax`], [`RunningMin`]
//! - [`accumulator_fn`] for closures

mod accumulator;
mod definition;


pub use accumulator::{
    accumulator_fn, Accumulator, ExponentialMovingAverage, FnAccumulator, RunningAverage,
    RunningMax, RunningMin, RunningSum,
};
pub use definition::{Metric, ResetPolicy};

pub(crate) use definition::MetricSet;
