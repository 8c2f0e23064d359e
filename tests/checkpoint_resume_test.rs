//! Integration tests for checkpointing and resuming runs

use bucle::storage::{CheckpointKey, CheckpointStore, FileStore, MemoryStore};
use bucle::train::{Checkpoint, Event, Filter, Loop, LoopState, Metric, Mode, RunConfig, RunningSum};
use tempfile::TempDir;

fn counting_loop() -> Loop<u64, u64> {
    Loop::from_fn(|total: &u64, x: u64| Ok(total + x))
        .metric(Metric::new("sum", |s: &u64| Ok(*s as f64), RunningSum))
        .expect("unique metric")
}

#[test]
fn test_checkpoints_keyed_by_epoch_and_iteration() {
    let store = MemoryStore::new();
    let mut training = counting_loop().on(
        Event::EpochCompleted,
        Filter::every(2).expect("valid"),
        Checkpoint::serialize(store.clone(), |s: &u64| s),
    );

    training
        .run(vec![1, 2, 3], 0, &RunConfig::new(5).expect("valid"))
        .expect("run should succeed");

    assert_eq!(
        store.keys().expect("keys"),
        vec![CheckpointKey::new(2, 3), CheckpointKey::new(4, 3)]
    );
    let record = store.load(CheckpointKey::new(4, 3)).expect("record exists");
    assert_eq!(record.payload_as::<u64>().expect("payload"), 24);
    assert_eq!(record.metrics.get("sum"), Some(&Some(19.0 + 21.0 + 24.0)));
}

#[test]
fn test_resume_from_file_checkpoint() {
    let dir = TempDir::new().expect("temp dir");
    let store = FileStore::new(dir.path());

    let mut first = counting_loop().on(
        Event::EpochCompleted,
        Filter::always(),
        Checkpoint::serialize(store.clone(), |s: &u64| s),
    );
    let halted_at = RunConfig::new(2).expect("valid");
    first.run(vec![5], 0, &halted_at).expect("run should succeed");

    let latest = store.latest().expect("listing").expect("checkpoint saved");
    assert_eq!(latest.key, CheckpointKey::new(2, 1));

    let state = LoopState::at_epoch(latest.payload_as::<u64>().expect("payload"), latest.key.epoch);
    let mut second = counting_loop();
    let outcome = second
        .resume(vec![5], state, &RunConfig::new(4).expect("valid"))
        .expect("resume should succeed");

    assert!(outcome.is_completed());
    assert_eq!(outcome.state.epoch(), 4);
    assert_eq!(outcome.into_step_state(), 20);
}

#[test]
fn test_save_best_only_keeps_improvements() {
    let store = MemoryStore::new();
    let mut training = Loop::from_fn(|_: &f64, x: f64| Ok(x))
        .metric(Metric::new("loss", |s: &f64| Ok(*s), RunningSum))
        .expect("unique metric")
        .on(
            Event::EpochCompleted,
            Filter::always(),
            Checkpoint::serialize(store.clone(), |s: &f64| s).save_best("loss", Mode::Min),
        );

    let losses = bucle::train::from_fn({
        let mut epoch = 0;
        move || {
            epoch += 1;
            vec![[3.0, 1.0, 2.0, 0.5][(epoch - 1) % 4]]
        }
    });
    training
        .run(losses, 0.0, &RunConfig::new(4).expect("valid"))
        .expect("run should succeed");

    let epochs: Vec<usize> = store.keys().expect("keys").iter().map(|k| k.epoch).collect();
    assert_eq!(epochs, vec![1, 2, 4]);
}
