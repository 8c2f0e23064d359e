//! Handler system for loop lifecycle events
//!
//! Handlers are registered per [`Event`](crate::train::Event) together with
//! a [`Filter`] and run in registration order:
//! - `started` / `completed` / `halted`
//! - `epoch_started` / `epoch_completed` / `epoch_halted`
//! - `iteration_started` / `iteration_completed`
//!
//! # Example
//!
//! ```rust
//! use bucle::train::{ControlTerm, Handler, LoopState};
//!
//! struct PrintEpoch;
//!
//! impl<S> Handler<S> for PrintEpoch {
//!     fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, bucle::BoxError> {
//!         println!("Epoch {} finished", state.epoch());
//!         Ok(ControlTerm::Continue)
//!     }
//! }
//! ```

mod checkpoint;
mod early_stopping;
mod filter;
mod history;
mod monitor;
mod progress;
mod registry;
mod scheduler;
mod traits;

pub use checkpoint::Checkpoint;
pub use early_stopping::EarlyStopping;
pub use filter::Filter;
pub use history::{EpochRecord, MetricsHistory};
pub use monitor::{Mode, TerminateOnNan};
pub use progress::{format_metrics, ProgressLogger};
pub use registry::HandlerRegistry;
pub use scheduler::ReduceLrOnPlateau;
pub use traits::{handler_fn, ControlTerm, FnHandler, Handler};
