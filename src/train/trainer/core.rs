//! Core Loop struct and builder methods

use crate::error::{BoxError, Result};
use crate::train::callback::{handler_fn, ControlTerm, Filter, Handler, HandlerRegistry};
use crate::train::event::Event;
use crate::train::metrics::{Metric, MetricSet};
use crate::train::state::LoopState;
use crate::train::step::{step_fn, Step};

/// Event-driven training loop over batches `B` and step state `S`
///
/// The loop owns its handler registry, so handlers never see or mutate the
/// registry while an event is being dispatched. Metric names are fixed once
/// added; a run cannot change them.
///
/// # Example
///
/// ```rust
/// use bucle::train::{ControlTerm, Event, Filter, Loop, RunConfig};
///
/// let mut training = Loop::from_fn(|w: &f64, x: f64| Ok(w + x));
/// training.on_fn(Event::EpochCompleted, Filter::always(), "stop_above_ten", |state| {
///     let above = state.step_state > 10.0;
///     Ok(if above { ControlTerm::HaltLoop } else { ControlTerm::Continue })
/// });
///
/// let outcome = training.run(vec![4.0], 0.0, &RunConfig::new(100).unwrap()).unwrap();
/// assert!(outcome.is_halted());
/// assert_eq!(outcome.state.epoch(), 3);
/// ```
pub struct Loop<B, S> {
    /// Step function
    pub(crate) step: Box<dyn Step<B, S>>,

    /// Metric definitions with their observation counts
    pub(crate) metrics: MetricSet<S>,

    /// Handlers per event
    pub(crate) handlers: HandlerRegistry<S>,
}

impl<B, S> Loop<B, S> {
    /// Create a loop around a [`Step`] implementation
    pub fn new<T>(step: T) -> Self
    where
        T: Step<B, S> + 'static,
    {
        Self { step: Box::new(step), metrics: MetricSet::new(), handlers: HandlerRegistry::new() }
    }

    /// Create a loop around a step closure
    pub fn from_fn<F>(step: F) -> Self
    where
        F: FnMut(&S, B) -> std::result::Result<S, BoxError> + Send + 'static,
    {
        Self::new(step_fn(step))
    }

    /// Add a metric, builder style
    ///
    /// Fails if a metric with the same name is already defined.
    pub fn metric(mut self, metric: Metric<S>) -> Result<Self> {
        self.add_metric(metric)?;
        Ok(self)
    }

    /// Add a metric
    pub fn add_metric(&mut self, metric: Metric<S>) -> Result<()> {
        self.metrics.push(metric)
    }

    /// Register a handler for `event`, builder style
    pub fn on<H>(mut self, event: Event, filter: Filter<S>, handler: H) -> Self
    where
        H: Handler<S> + 'static,
    {
        self.handle(event, filter, handler);
        self
    }

    /// Register a handler for `event`
    ///
    /// Handlers of one event run in registration order.
    pub fn handle<H>(&mut self, event: Event, filter: Filter<S>, handler: H)
    where
        H: Handler<S> + 'static,
    {
        self.handlers.register(event, handler, filter);
    }

    /// Register a closure as handler for `event`
    ///
    /// `name` identifies the handler in logs and error reports.
    pub fn on_fn<F>(&mut self, event: Event, filter: Filter<S>, name: impl Into<String>, f: F)
    where
        F: FnMut(&mut LoopState<S>) -> std::result::Result<ControlTerm, BoxError> + Send + 'static,
    {
        self.handlers.register(event, handler_fn(name, f), filter);
    }

    /// Registered handlers
    pub fn handlers(&self) -> &HandlerRegistry<S> {
        &self.handlers
    }

    /// Metric names in definition order
    pub fn metric_names(&self) -> Vec<&str> {
        self.metrics.names()
    }
}

impl<B, S> std::fmt::Debug for Loop<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loop")
            .field("metrics", &self.metrics.names())
            .field("handlers", &self.handlers.len())
            .finish_non_exhaustive()
    }
}
