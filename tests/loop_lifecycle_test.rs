//! Integration tests for the loop lifecycle through the public API

use std::sync::{Arc, Mutex};

use bucle::train::{
    supervised, Batch, ControlTerm, EarlyStopping, Event, Filter, Loop, Metric,
    MetricsHistory, Mode, ReduceLrOnPlateau, RunConfig, RunningAverage, StepOutput,
    TerminateOnNan, TrainState,
};
use bucle::linear::Sgd;
use bucle::{BoxError, Error};

type State = TrainState<f64, Sgd>;

fn constant_loss_step(
    loss: f64,
) -> impl FnMut(&f64, &Sgd, &Batch) -> Result<StepOutput<f64, Sgd>, BoxError> {
    move |w, opt, batch| {
        Ok(StepOutput { params: *w, optimizer: *opt, loss, predictions: batch.targets.clone() })
    }
}

fn batches(n: usize) -> Vec<Batch> {
    (0..n)
        .map(|i| Batch::new(vec![i as f64], vec![i as f64]).expect("shapes match"))
        .collect()
}

#[test]
fn test_early_stopping_halts_plateaued_run() {
    let history = MetricsHistory::new();
    let mut training: Loop<Batch, State> = Loop::new(supervised(constant_loss_step(1.0)))
        .metric(Metric::new("loss", |s: &State| Ok(s.loss), RunningAverage))
        .expect("unique metric")
        .on(Event::EpochCompleted, Filter::always(), history.clone())
        .on(Event::EpochCompleted, Filter::always(), EarlyStopping::new("loss", 2));

    let outcome = training
        .run(batches(3), TrainState::new(0.0, Sgd { lr: 0.1 }), &RunConfig::new(10).expect("valid"))
        .expect("run should succeed");

    assert!(outcome.is_halted());
    assert_eq!(outcome.state.epoch(), 3);
    assert_eq!(history.values("loss"), vec![1.0, 1.0, 1.0]);
}

#[test]
fn test_nan_guard_halts_mid_epoch() {
    let mut calls = 0;
    let step = supervised(move |w: &f64, opt: &Sgd, batch: &Batch| {
        calls += 1;
        let loss = if calls == 5 { f64::NAN } else { 0.5 };
        Ok(StepOutput { params: *w, optimizer: *opt, loss, predictions: batch.targets.clone() })
    });
    let mut training: Loop<Batch, State> = Loop::new(step)
        .metric(Metric::new("loss", |s: &State| Ok(s.loss), RunningAverage))
        .expect("unique metric")
        .on(Event::IterationCompleted, Filter::always(), TerminateOnNan::new("loss"));

    let outcome = training
        .run(batches(3), TrainState::new(0.0, Sgd { lr: 0.1 }), &RunConfig::new(4).expect("valid"))
        .expect("run should succeed");

    assert!(outcome.is_halted());
    assert_eq!((outcome.state.epoch(), outcome.state.iteration()), (2, 2));
    assert!(outcome.metric("loss").is_some_and(f64::is_nan));
}

#[test]
fn test_plateau_scheduler_lowers_learning_rate() {
    let lrs = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&lrs);
    let mut training: Loop<Batch, State> = Loop::new(supervised(constant_loss_step(2.0)))
        .metric(Metric::new("loss", |s: &State| Ok(s.loss), RunningAverage))
        .expect("unique metric")
        .on(
            Event::EpochCompleted,
            Filter::always(),
            ReduceLrOnPlateau::new("loss", 0.5, 1).expect("valid factor").mode(Mode::Min),
        );
    training.on_fn(Event::EpochStarted, Filter::always(), "record_lr", move |state| {
        log.lock().expect("lock").push(state.step_state.optimizer.lr);
        Ok(ControlTerm::Continue)
    });

    training
        .run(batches(2), TrainState::new(0.0, Sgd { lr: 0.8 }), &RunConfig::new(4).expect("valid"))
        .expect("run should succeed");

    assert_eq!(*lrs.lock().expect("lock"), vec![0.8, 0.8, 0.4, 0.2]);
}

#[test]
fn test_batch_shape_mismatch_fails_fast() {
    let err = Batch::new(vec![1.0, 2.0, 3.0], vec![1.0]).expect_err("mismatched rows");
    assert!(matches!(err, Error::BatchShape { inputs: 3, targets: 1 }));
}

#[test]
fn test_handler_failure_carries_last_state() {
    let mut training: Loop<Batch, State> = Loop::new(supervised(constant_loss_step(0.1)));
    let every_two = Filter::every(2).expect("valid");
    training.on_fn(Event::IterationCompleted, every_two, "log_iteration", |state| {
        Err(format!("cannot log iteration {}", state.iteration()).into())
    });

    let failure = training
        .run(batches(3), TrainState::new(0.0, Sgd { lr: 0.1 }), &RunConfig::new(1).expect("valid"))
        .expect_err("handler fails");

    assert_eq!(failure.error.position(), Some((1, 2)));
    assert_eq!(failure.state.step_state.targets, vec![1.0]);
    assert!(failure.to_string().contains("cannot log iteration 2"));
    assert!(matches!(&failure.error, Error::Handler { handler, .. } if handler == "log_iteration"));
}
