//! Progress handler logging run lifecycle and metrics through `tracing`

use std::fmt::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tracing::{debug, info};

use super::traits::{ControlTerm, Handler};
use crate::error::BoxError;
use crate::train::event::Event;
use crate::train::state::{LoopState, MetricValues};

/// Logs progress for whatever event it is registered on
///
/// Iteration events log at debug level, everything else at info. Clones
/// share one clock, which `started` restarts, so register clones of a single
/// logger to time every event from the start of the run.
#[derive(Clone, Debug)]
pub struct ProgressLogger {
    started: Arc<Mutex<Instant>>,
}

impl ProgressLogger {
    /// Create progress logger
    pub fn new() -> Self {
        Self { started: Arc::new(Mutex::new(Instant::now())) }
    }

    fn restart(&self) {
        if let Ok(mut started) = self.started.lock() {
            *started = Instant::now();
        }
    }

    fn elapsed_secs(&self) -> f64 {
        self.started.lock().map_or(0.0, |s| s.elapsed().as_secs_f64())
    }
}

impl Default for ProgressLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Render metrics as `name=value` pairs in definition order
pub fn format_metrics(metrics: &MetricValues) -> String {
    let mut out = String::new();
    for (i, (name, value)) in metrics.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{name}={value:.4}");
    }
    out
}

impl<S> Handler<S> for ProgressLogger {
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError> {
        let metrics = format_metrics(state.metrics());
        let epoch = state.epoch();
        let max_epochs = state.max_epochs();

        match state.event() {
            Some(Event::Started) => {
                self.restart();
                info!(max_epochs, max_iterations = ?state.max_iterations(), "run started");
            }
            Some(Event::EpochStarted) => debug!("Epoch {epoch}/{max_epochs} starting"),
            Some(Event::IterationStarted) => {}
            Some(Event::IterationCompleted) => {
                debug!("  Iteration {}: {metrics}", state.iteration());
            }
            Some(Event::EpochCompleted) => {
                let elapsed = self.elapsed_secs();
                info!("Epoch {epoch}/{max_epochs}: {metrics} ({elapsed:.1}s)");
            }
            Some(Event::EpochHalted) => {
                let completed = state.completed_iterations();
                info!("Epoch {epoch}/{max_epochs} halted after {completed} iterations: {metrics}");
            }
            Some(Event::Halted) => {
                let elapsed = self.elapsed_secs();
                info!("Run halted at epoch {epoch}: {metrics} ({elapsed:.1}s)");
            }
            Some(Event::Completed) => {
                let elapsed = self.elapsed_secs();
                info!("Run completed after {epoch} epochs: {metrics} ({elapsed:.1}s)");
            }
            None => {}
        }
        Ok(ControlTerm::Continue)
    }

    fn name(&self) -> &str {
        "ProgressLogger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_metrics() {
        let metrics =
            MetricValues::new(vec![("loss".to_string(), 0.25), ("acc".to_string(), 0.5)]);
        assert_eq!(format_metrics(&metrics), "loss=0.2500 acc=0.5000");
        assert_eq!(format_metrics(&MetricValues::default()), "");
    }

    #[test]
    fn test_progress_logger_always_continues() {
        let mut logger = ProgressLogger::default();
        let mut state = LoopState::new(());
        for event in Event::ALL {
            state.set_event(event);
            assert_eq!(logger.invoke(&mut state).unwrap(), ControlTerm::Continue);
        }
    }

    #[test]
    fn test_started_restarts_clock_of_every_clone() {
        let logger = ProgressLogger::new();
        let mut on_started = logger.clone();
        let Some(earlier) = Instant::now().checked_sub(std::time::Duration::from_secs(60)) else {
            return;
        };
        *logger.started.lock().unwrap() = earlier;
        assert!(on_started.elapsed_secs() >= 60.0);

        let mut state = LoopState::new(());
        state.set_event(Event::Started);
        on_started.invoke(&mut state).unwrap();
        assert!(logger.elapsed_secs() < 60.0);
    }
}
