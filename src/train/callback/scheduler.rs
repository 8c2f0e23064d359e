//! Learning rate reduction when a monitored metric plateaus

use tracing::info;

use super::monitor::{MetricMonitor, Mode};
use super::traits::{ControlTerm, Handler};
use crate::error::{BoxError, Error, Result};
use crate::train::state::LoopState;
use crate::train::step::LearningRate;

/// Multiply the learning rate by `factor` after `patience` firings without improvement
///
/// Requires a step state implementing [`LearningRate`]. The rate never drops
/// below `min_lr`.
///
/// # Example
///
/// ```rust
/// use bucle::train::ReduceLrOnPlateau;
///
/// let scheduler = ReduceLrOnPlateau::new("loss", 0.5, 2).unwrap().min_lr(1e-5);
/// assert_eq!(scheduler.factor(), 0.5);
/// ```
#[derive(Clone, Debug)]
pub struct ReduceLrOnPlateau {
    monitor: MetricMonitor,
    factor: f64,
    patience: usize,
    min_lr: f64,
}

impl ReduceLrOnPlateau {
    /// Monitor `metric`; `factor` must lie in (0, 1)
    pub fn new(metric: impl Into<String>, factor: f64, patience: usize) -> Result<Self> {
        if !(factor > 0.0 && factor < 1.0) {
            return Err(Error::config("factor", format!("{factor} (must be in (0, 1))")));
        }
        Ok(Self {
            monitor: MetricMonitor::new(metric),
            factor,
            patience: patience.max(1),
            min_lr: 0.0,
        })
    }

    /// Set the direction of improvement
    pub fn mode(mut self, mode: Mode) -> Self {
        self.monitor.set_mode(mode);
        self
    }

    /// Lower bound on the learning rate
    pub fn min_lr(mut self, min_lr: f64) -> Self {
        self.min_lr = min_lr.max(0.0);
        self
    }

    /// Reduction factor
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl<S: LearningRate> Handler<S> for ReduceLrOnPlateau {
    fn invoke(&mut self, state: &mut LoopState<S>) -> std::result::Result<ControlTerm, BoxError> {
        let value = self.monitor.read(state)?;
        self.monitor.observe(value);
        if self.monitor.since_best < self.patience {
            return Ok(ControlTerm::Continue);
        }

        let old_lr = state.step_state.learning_rate();
        let new_lr = (old_lr * self.factor).max(self.min_lr);
        if new_lr < old_lr {
            state.step_state.set_learning_rate(new_lr);
            info!(
                metric = self.monitor.metric(),
                old_lr,
                new_lr,
                epoch = state.epoch(),
                "reducing learning rate"
            );
        }
        self.monitor.since_best = 0;
        Ok(ControlTerm::Continue)
    }

    fn name(&self) -> &str {
        "ReduceLrOnPlateau"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::train::state::MetricValues;
    use approx::assert_relative_eq;

    struct Sgd {
        lr: f64,
    }

    impl LearningRate for Sgd {
        fn learning_rate(&self) -> f64 {
            self.lr
        }

        fn set_learning_rate(&mut self, lr: f64) {
            self.lr = lr;
        }
    }

    fn fire(handler: &mut ReduceLrOnPlateau, state: &mut LoopState<Sgd>, loss: f64) {
        state.set_metric("loss", loss);
        assert_eq!(handler.invoke(state).unwrap(), ControlTerm::Continue);
    }

    fn state() -> LoopState<Sgd> {
        let mut state = LoopState::new(Sgd { lr: 0.1 });
        state.begin_run(10, None, MetricValues::new(vec![("loss".to_string(), 0.0)]));
        state
    }

    #[test]
    fn test_factor_must_be_fraction() {
        assert!(ReduceLrOnPlateau::new("loss", 1.0, 1).unwrap_err().is_config_error());
        assert!(ReduceLrOnPlateau::new("loss", 0.0, 1).is_err());
        assert!(ReduceLrOnPlateau::new("loss", f64::NAN, 1).is_err());
    }

    #[test]
    fn test_reduces_after_patience() {
        let mut handler = ReduceLrOnPlateau::new("loss", 0.5, 2).unwrap();
        let mut state = state();

        fire(&mut handler, &mut state, 1.0);
        fire(&mut handler, &mut state, 1.0);
        assert_relative_eq!(state.step_state.lr, 0.1);
        fire(&mut handler, &mut state, 1.0);
        assert_relative_eq!(state.step_state.lr, 0.05);
        fire(&mut handler, &mut state, 0.5);
        assert_relative_eq!(state.step_state.lr, 0.05);
    }

    #[test]
    fn test_respects_min_lr() {
        let mut handler = ReduceLrOnPlateau::new("loss", 0.1, 1).unwrap().min_lr(0.05);
        let mut state = state();

        fire(&mut handler, &mut state, 1.0);
        fire(&mut handler, &mut state, 1.0);
        assert_relative_eq!(state.step_state.lr, 0.05);
        fire(&mut handler, &mut state, 1.0);
        assert_relative_eq!(state.step_state.lr, 0.05);
    }
}
