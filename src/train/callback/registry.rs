//! Handler registry and event dispatcher

use std::collections::BTreeMap;

use super::filter::{Filter, Gate};
use super::traits::{ControlTerm, Handler};
use crate::error::{Error, Result};
use crate::train::event::Event;
use crate::train::state::LoopState;

struct Registration<S> {
    handler: Box<dyn Handler<S>>,
    gate: Gate<S>,
}

/// Per-event ordered handlers
///
/// Registration order is invocation order. Dispatch stops at the first
/// handler that asks for a halt.
pub struct HandlerRegistry<S> {
    handlers: BTreeMap<Event, Vec<Registration<S>>>,
}

impl<S> HandlerRegistry<S> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self { handlers: BTreeMap::new() }
    }

    /// Append `handler` to the handlers of `event`
    pub fn register<H>(&mut self, event: Event, handler: H, filter: Filter<S>)
    where
        H: Handler<S> + 'static,
    {
        self.handlers.entry(event).or_default().push(Registration {
            handler: Box::new(handler),
            gate: Gate::new(filter),
        });
    }

    /// Number of handlers registered for `event`
    pub fn count(&self, event: Event) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Number of registrations across all events
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Check if no handlers are registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handler names for `event` in invocation order
    pub fn names(&self, event: Event) -> Vec<&str> {
        self.handlers
            .get(&event)
            .map(|regs| regs.iter().map(|r| r.handler.name()).collect())
            .unwrap_or_default()
    }

    /// Forget filter bookkeeping (`once` filters fire again)
    pub fn reset_filters(&mut self) {
        for reg in self.handlers.values_mut().flatten() {
            reg.gate.reset();
        }
    }

    /// Fire `event`: invoke every admitted handler in registration order
    ///
    /// Returns the first non-`Continue` term, skipping the remaining
    /// handlers, or `Continue` if no handler asked for a halt. A handler
    /// error aborts the dispatch.
    pub fn dispatch(&mut self, event: Event, state: &mut LoopState<S>) -> Result<ControlTerm> {
        state.set_event(event);
        let Some(regs) = self.handlers.get_mut(&event) else {
            return Ok(ControlTerm::Continue);
        };

        for reg in regs.iter_mut() {
            if !reg.gate.admits(event, state) {
                continue;
            }
            let term = reg.handler.invoke(state).map_err(|source| Error::Handler {
                event,
                handler: reg.handler.name().to_string(),
                epoch: state.epoch(),
                iteration: state.iteration(),
                source,
            })?;
            if term.is_halt() {
                return Ok(term);
            }
        }
        Ok(ControlTerm::Continue)
    }
}

impl<S> Default for HandlerRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
