//! Accumulators: pure folds producing a metric's running aggregate

use crate::error::{Error, Result};

/// Pure fold `(aggregate, observation, index) -> aggregate`
///
/// `index` is the 0-based number of observations folded since the last reset.
/// Implementations hold configuration only; all running state is threaded
/// through `current`.
pub trait Accumulator: Send {
    /// Value the aggregate is reset to
    fn identity(&self) -> f64;

    /// Fold one observation into the aggregate
    fn accumulate(&self, current: f64, observation: f64, index: usize) -> f64;

    /// Name used in logs
    fn name(&self) -> &str {
        "accumulator"
    }
}

/// Numerically stable incremental mean
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningAverage;

impl Accumulator for RunningAverage {
    fn identity(&self) -> f64 {
        0.0
    }

    fn accumulate(&self, current: f64, observation: f64, index: usize) -> f64 {
        current + (observation - current) / (index as f64 + 1.0)
    }

    fn name(&self) -> &str {
        "running_average"
    }
}

/// Sum of all observations
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningSum;

impl Accumulator for RunningSum {
    fn identity(&self) -> f64 {
        0.0
    }

    fn accumulate(&self, current: f64, observation: f64, _index: usize) -> f64 {
        current + observation
    }

    fn name(&self) -> &str {
        "running_sum"
    }
}

/// Exponential moving average `x * alpha + old * (1 - alpha)`
///
/// The aggregate starts at 0.0, so early values are biased toward zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExponentialMovingAverage {
    alpha: f64,
}

impl ExponentialMovingAverage {
    /// Create an EMA with smoothing factor `alpha` in (0, 1]
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(Error::config("alpha", format!("{alpha} (must be in (0.0, 1.0])")));
        }
        Ok(Self { alpha })
    }

    /// Smoothing factor
    pub fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Accumulator for ExponentialMovingAverage {
    fn identity(&self) -> f64 {
        0.0
    }

    fn accumulate(&self, current: f64, observation: f64, _index: usize) -> f64 {
        observation * self.alpha + current * (1.0 - self.alpha)
    }

    fn name(&self) -> &str {
        "exponential_moving_average"
    }
}

/// Largest observation seen
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningMax;

impl Accumulator for RunningMax {
    fn identity(&self) -> f64 {
        f64::NEG_INFINITY
    }

    fn accumulate(&self, current: f64, observation: f64, _index: usize) -> f64 {
        current.max(observation)
    }

    fn name(&self) -> &str {
        "running_max"
    }
}

/// Smallest observation seen
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningMin;

impl Accumulator for RunningMin {
    fn identity(&self) -> f64 {
        f64::INFINITY
    }

    fn accumulate(&self, current: f64, observation: f64, _index: usize) -> f64 {
        current.min(observation)
    }

    fn name(&self) -> &str {
        "running_min"
    }
}

/// Accumulator backed by a closure
pub struct FnAccumulator<F> {
    identity: f64,
    fold: F,
}

impl<F> Accumulator for FnAccumulator<F>
where
    F: Fn(f64, f64, usize) -> f64 + Send,
{
    fn identity(&self) -> f64 {
        self.identity
    }

    fn accumulate(&self, current: f64, observation: f64, index: usize) -> f64 {
        (self.fold)(current, observation, index)
    }

    fn name(&self) -> &str {
        "custom"
    }
}

/// Build an accumulator from an identity value and a fold closure
///
/// # Example
///
/// ```rust
/// use bucle::train::{accumulator_fn, Accumulator};
///
/// let count = accumulator_fn(0.0, |old, _x, _i| old + 1.0);
/// assert_eq!(count.accumulate(2.0, 9.0, 2), 3.0);
/// ```
pub fn accumulator_fn<F>(identity: f64, fold: F) -> FnAccumulator<F>
where
    F: Fn(f64, f64, usize) -> f64 + Send,
{
    FnAccumulator { identity, fold }
}
