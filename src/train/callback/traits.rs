//! Core traits and types for the handler system
//!
//! - `ControlTerm` - What a handler asks the loop to do next
//! - `Handler` - The trait all handlers implement
//! - `FnHandler` - Adapter turning a closure into a named handler

use crate::error::BoxError;
use crate::train::state::LoopState;

/// Signal returned by every handler
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControlTerm {
    /// Keep running
    #[default]
    Continue,
    /// Abort the current epoch and move on to the next one
    HaltEpoch,
    /// Abort the whole run
    HaltLoop,
}

impl ControlTerm {
    /// Whether this term stops the current dispatch
    pub fn is_halt(self) -> bool {
        self != ControlTerm::Continue
    }
}

/// Callback bound to a lifecycle event
///
/// A handler receives exclusive access to the loop state for the duration of
/// the call. It may read counters and metrics, rewrite the step state or
/// metric values, and asks the loop to continue or halt through its
/// [`ControlTerm`]. Handlers are the only place the loop performs I/O.
pub trait Handler<S>: Send {
    /// Run the handler for the event in `state.event()`
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError>;

    /// Handler name used in logs and error reports
    fn name(&self) -> &str {
        "handler"
    }
}

impl<S> Handler<S> for Box<dyn Handler<S>> {
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError> {
        (**self).invoke(state)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Handler backed by a closure
pub struct FnHandler<F> {
    name: String,
    f: F,
}

impl<S, F> Handler<S> for FnHandler<F>
where
    F: FnMut(&mut LoopState<S>) -> Result<ControlTerm, BoxError> + Send,
{
    fn invoke(&mut self, state: &mut LoopState<S>) -> Result<ControlTerm, BoxError> {
        (self.f)(state)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build a named handler from a closure
///
/// # Example
///
/// ```rust
/// use bucle::train::{handler_fn, ControlTerm, Handler, LoopState};
///
/// let mut stop_after_two = handler_fn("stop_after_two", |state: &mut LoopState<()>| {
///     Ok(if state.epoch() >= 2 { ControlTerm::HaltLoop } else { ControlTerm::Continue })
/// });
/// assert_eq!(stop_after_two.name(), "stop_after_two");
/// let mut state = LoopState::new(());
/// assert_eq!(stop_after_two.invoke(&mut state).unwrap(), ControlTerm::Continue);
/// ```
pub fn handler_fn<S, F>(name: impl Into<String>, f: F) -> FnHandler<F>
where
    F: FnMut(&mut LoopState<S>) -> Result<ControlTerm, BoxError> + Send,
{
    FnHandler { name: name.into(), f }
}
