//! Step functions: the externally supplied optimization step
//!
//! The loop treats a step as a synchronous call from the current step state
//! and one batch to the next step state. A failing step leaves the previous
//! state untouched.

use serde::{Deserialize, Serialize};

use super::batch::Batch;
use crate::error::BoxError;

/// One optimization step
pub trait Step<B, S>: Send {
    /// Produce the next step state from the current one and a batch
    fn step(&mut self, state: &S, batch: B) -> Result<S, BoxError>;
}

/// Step backed by a closure
pub struct StepFn<F>(F);

impl<B, S, F> Step<B, S> for StepFn<F>
where
    F: FnMut(&S, B) -> Result<S, BoxError> + Send,
{
    fn step(&mut self, state: &S, batch: B) -> Result<S, BoxError> {
        (self.0)(state, batch)
    }
}

/// Wrap a closure as a [`Step`]
pub fn step_fn<B, S, F>(f: F) -> StepFn<F>
where
    F: FnMut(&S, B) -> Result<S, BoxError> + Send,
{
    StepFn(f)
}

/// Step states whose optimizer exposes a learning rate
pub trait LearningRate {
    /// Current learning rate
    fn learning_rate(&self) -> f64;

    /// Replace the learning rate
    fn set_learning_rate(&mut self, lr: f64);
}

/// Conventional step state for supervised training
///
/// Holds model parameters, optimizer state and the most recent batch with its
/// predictions and loss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainState<P, O, X = f64> {
    /// Trainable parameters
    pub params: P,
    /// Optimizer state
    pub optimizer: O,
    /// Loss of the most recent batch
    pub loss: f64,
    /// Inputs of the most recent batch
    pub inputs: Vec<X>,
    /// Targets of the most recent batch
    pub targets: Vec<f64>,
    /// Predictions for the most recent batch
    pub predictions: Vec<f64>,
}

impl<P, O, X> TrainState<P, O, X> {
    /// State before any batch has been seen
    pub fn new(params: P, optimizer: O) -> Self {
        Self {
            params,
            optimizer,
            loss: f64::NAN,
            inputs: Vec::new(),
            targets: Vec::new(),
            predictions: Vec::new(),
        }
    }
}

impl<P, O: LearningRate, X> LearningRate for TrainState<P, O, X> {
    fn learning_rate(&self) -> f64 {
        self.optimizer.learning_rate()
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.optimizer.set_learning_rate(lr);
    }
}

/// Result of one supervised step
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutput<P, O> {
    /// Updated parameters
    pub params: P,
    /// Updated optimizer state
    pub optimizer: O,
    /// Loss on the batch
    pub loss: f64,
    /// One prediction per batch row
    pub predictions: Vec<f64>,
}

/// Adapter from `(params, optimizer, batch) -> StepOutput` to a [`Step`] over [`TrainState`]
pub struct SupervisedStep<F>(F);

impl<P, O, X, F> Step<Batch<X>, TrainState<P, O, X>> for SupervisedStep<F>
where
    F: FnMut(&P, &O, &Batch<X>) -> Result<StepOutput<P, O>, BoxError> + Send,
{
    fn step(
        &mut self,
        state: &TrainState<P, O, X>,
        batch: Batch<X>,
    ) -> Result<TrainState<P, O, X>, BoxError> {
        let out = (self.0)(&state.params, &state.optimizer, &batch)?;
        if out.predictions.len() != batch.targets.len() {
            return Err(format!(
                "step returned {} predictions for {} targets",
                out.predictions.len(),
                batch.targets.len()
            )
            .into());
        }
        Ok(TrainState {
            params: out.params,
            optimizer: out.optimizer,
            loss: out.loss,
            inputs: batch.inputs,
            targets: batch.targets,
            predictions: out.predictions,
        })
    }
}

/// Wrap a `(params, optimizer, batch)` closure as a [`Step`] over [`TrainState`]
pub fn supervised<P, O, X, F>(f: F) -> SupervisedStep<F>
where
    F: FnMut(&P, &O, &Batch<X>) -> Result<StepOutput<P, O>, BoxError> + Send,
{
    SupervisedStep(f)
}
