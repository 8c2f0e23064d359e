//! One-feature linear regression trained with plain SGD
//!
//! Used by `bucle fit` to drive the loop end to end on synthetic data
//! `y = slope * x + intercept`.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::FitSpec;
use crate::error::{BoxError, Error, Result};
use crate::storage::{CheckpointStore, FileStore};
use crate::train::{
    accumulator_fn, supervised, Batch, Checkpoint, EarlyStopping, Event, ExponentialMovingAverage,
    Filter, LearningRate, Loop, LoopState, Metric, MetricsHistory, Mode, ProgressLogger,
    ReduceLrOnPlateau, ResetPolicy, RunningAverage, RunningMax, StepOutput, TerminateOnNan,
    TrainState,
};

/// `y = weight * x + bias`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Slope
    pub weight: f64,
    /// Intercept
    pub bias: f64,
}

impl LinearModel {
    /// Predict one output
    pub fn predict(&self, x: f64) -> f64 {
        self.weight * x + self.bias
    }
}

/// Stateless SGD; the learning rate is its only state
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    /// Learning rate
    pub lr: f64,
}

impl LearningRate for Sgd {
    fn learning_rate(&self) -> f64 {
        self.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.lr = lr;
    }
}

/// Step state of the linear fit
pub type LinearState = TrainState<LinearModel, Sgd>;

/// Durable part of a [`LinearState`] written to checkpoints
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Model parameters
    pub model: LinearModel,
    /// Optimizer state
    pub optimizer: Sgd,
}

impl Snapshot {
    /// Capture the durable part of `state`
    pub fn of(state: &LinearState) -> Self {
        Self { model: state.params, optimizer: state.optimizer }
    }
}

/// Evenly spaced samples over [-1, 1], chunked into batches
pub fn synthetic_batches(spec: &FitSpec) -> Result<Vec<Batch>> {
    let data = &spec.data;
    if data.batch_size == 0 {
        return Err(Error::config("data.batch_size", "0 (must be > 0)"));
    }
    let n = data.samples;
    let xs: Vec<f64> = (0..n)
        .map(|i| if n == 1 { 0.0 } else { -1.0 + 2.0 * i as f64 / (n - 1) as f64 })
        .collect();

    xs.chunks(data.batch_size)
        .map(|chunk| {
            let targets = chunk.iter().map(|x| data.slope * x + data.intercept).collect();
            Batch::new(chunk.to_vec(), targets)
        })
        .collect()
}

/// One SGD step on the mean squared error
pub fn sgd_step(
    model: &LinearModel,
    sgd: &Sgd,
    batch: &Batch,
) -> std::result::Result<StepOutput<LinearModel, Sgd>, BoxError> {
    if batch.is_empty() {
        return Err("empty batch".into());
    }
    let n = batch.size() as f64;
    let predictions: Vec<f64> = batch.inputs.iter().map(|x| model.predict(*x)).collect();

    let (mut grad_w, mut grad_b, mut loss) = (0.0, 0.0, 0.0);
    for ((p, x), t) in predictions.iter().zip(&batch.inputs).zip(&batch.targets) {
        let err = p - t;
        grad_w += 2.0 * err * x;
        grad_b += 2.0 * err;
        loss += err * err;
    }

    Ok(StepOutput {
        params: LinearModel {
            weight: model.weight - sgd.lr * grad_w / n,
            bias: model.bias - sgd.lr * grad_b / n,
        },
        optimizer: *sgd,
        loss: loss / n,
        predictions,
    })
}

fn max_abs_error(state: &LinearState) -> f64 {
    state
        .predictions
        .iter()
        .zip(&state.targets)
        .map(|(p, t)| (p - t).abs())
        .fold(0.0, f64::max)
}

/// Build the loop described by `spec`
///
/// Metrics: `loss` (epoch mean), `loss_ema` (across the run), `max_abs_error`
/// (epoch max) and `lr` (last value). Returns the loop and a handle on the
/// per-epoch metric history it records.
pub fn build_loop(spec: &FitSpec) -> Result<(Loop<Batch, LinearState>, MetricsHistory)> {
    let mut training: Loop<Batch, LinearState> = Loop::new(supervised(sgd_step))
        .metric(Metric::new("loss", |s: &LinearState| Ok(s.loss), RunningAverage))?
        .metric(
            Metric::new(
                "loss_ema",
                |s: &LinearState| Ok(s.loss),
                ExponentialMovingAverage::new(0.1)?,
            )
            .with_reset_policy(ResetPolicy::PerRun),
        )?
        .metric(Metric::new("max_abs_error", |s: &LinearState| Ok(max_abs_error(s)), RunningMax))?
        .metric(Metric::new(
            "lr",
            |s: &LinearState| Ok(s.optimizer.lr),
            accumulator_fn(0.0, |_, lr, _| lr),
        ))?;

    let every_log = Filter::every(spec.logging.every)?;
    training.handle(Event::IterationCompleted, Filter::always(), TerminateOnNan::new("loss"));
    let progress = ProgressLogger::new();
    training.handle(Event::Started, Filter::always(), progress.clone());
    training.handle(Event::EpochCompleted, every_log, progress.clone());
    training.handle(Event::EpochHalted, Filter::always(), progress.clone());
    training.handle(Event::Halted, Filter::always(), progress.clone());
    training.handle(Event::Completed, Filter::always(), progress);

    let history = MetricsHistory::new();
    training.handle(Event::EpochCompleted, Filter::always(), history.clone());
    training.handle(Event::EpochHalted, Filter::always(), history.clone());

    if let Some(cp) = &spec.checkpoint {
        let store = FileStore::new(cp.dir.clone());
        let mut checkpoint = Checkpoint::new(store, |s: &LinearState| {
            Ok(serde_json::to_value(Snapshot::of(s))?)
        });
        if cp.save_best {
            checkpoint = checkpoint.save_best("loss", Mode::Min);
        }
        training.handle(Event::EpochCompleted, Filter::every(cp.every)?, checkpoint);
    }

    if let Some(plateau) = &spec.optimizer.plateau {
        let scheduler = ReduceLrOnPlateau::new("loss", plateau.factor, plateau.patience)?
            .min_lr(plateau.min_lr);
        training.handle(Event::EpochCompleted, Filter::always(), scheduler);
    }

    if let Some(early) = &spec.early_stopping {
        let stopper = EarlyStopping::new("loss", early.patience).min_delta(early.min_delta);
        training.handle(Event::EpochCompleted, Filter::always(), stopper);
    }

    Ok((training, history))
}

/// Fresh state, or the state stored in the latest checkpoint when `resume` is set
pub fn initial_state(spec: &FitSpec, resume: bool) -> Result<LoopState<LinearState>> {
    let sgd = Sgd { lr: spec.optimizer.lr };
    let fresh = LoopState::new(LinearState::new(LinearModel::default(), sgd));
    if !resume {
        return Ok(fresh);
    }

    let Some(cp) = &spec.checkpoint else {
        return Err(Error::config("checkpoint.dir", "resuming requires a checkpoint directory"));
    };
    match FileStore::new(cp.dir.clone()).latest()? {
        Some(record) => {
            let snapshot: Snapshot = record.payload_as()?;
            info!(key = %record.key, "resuming from checkpoint");
            Ok(LoopState::at_epoch(
                LinearState::new(snapshot.model, snapshot.optimizer),
                record.key.epoch,
            ))
        }
        None => {
            warn!(dir = %cp.dir.display(), "no checkpoint found, starting fresh");
            Ok(fresh)
        }
    }
}
