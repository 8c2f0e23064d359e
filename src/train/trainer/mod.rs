//! Loop driver
//!
//! A [`Loop`] owns a step function, metric definitions and the handler
//! registry, and drives runs through the lifecycle:
//! - `started`
//! - per epoch: `epoch_started`, per batch `iteration_started` /
//!   `iteration_completed`, then `epoch_completed` or `epoch_halted`
//! - exactly one of `completed` / `halted`
//!
//! # Example
//!
//! ```rust
//! use bucle::train::{ControlTerm, Event, Filter, Loop, Metric, RunConfig, RunningSum};
//!
//! let mut counting = Loop::from_fn(|total: &f64, x: f64| Ok(total + x))
//!     .metric(Metric::new("seen", |total: &f64| Ok(*total), RunningSum))
//!     .unwrap();
//! counting.on_fn(Event::Started, Filter::always(), "check_start", |state| {
//!     assert_eq!(state.epoch(), 0);
//!     Ok(ControlTerm::Continue)
//! });
//!
//! let outcome = counting.run(vec![1.0, 2.0], 0.0, &RunConfig::new(3).unwrap()).unwrap();
//! assert!(outcome.is_completed());
//! assert_eq!(outcome.state.step_state, 9.0);
//! ```

mod core;
mod epoch;
mod result;
mod train_loop;

pub use core::Loop;
pub use result::{RunFailure, RunOutcome};
