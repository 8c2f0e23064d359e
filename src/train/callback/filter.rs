//! Filters gating whether a handler fires for an event occurrence

use std::num::NonZeroUsize;

use crate::error::{Error, Result};
use crate::train::event::Event;
use crate::train::state::LoopState;

type Predicate<S> = Box<dyn Fn(&LoopState<S>) -> bool + Send>;

/// Predicate controlling whether a handler fires
///
/// `Every(n)` counts iterations within the epoch for iteration events, epochs
/// for epoch events, and run-level occurrences for `started`, `completed` and
/// `halted`. There are no implicit firings at the first or last occurrence.
pub enum Filter<S> {
    /// Fire at every occurrence
    Always,
    /// Fire only on the first evaluation in a run
    Once,
    /// Fire when the event's counter is a multiple of `n`
    Every(NonZeroUsize),
    /// Fire when the predicate holds
    Predicate(Predicate<S>),
}

impl<S> Filter<S> {
    /// Fire at every occurrence
    pub fn always() -> Self {
        Filter::Always
    }

    /// Fire on the first evaluation only
    pub fn once() -> Self {
        Filter::Once
    }

    /// Fire every `n` occurrences; `n` must be positive
    pub fn every(n: usize) -> Result<Self> {
        NonZeroUsize::new(n)
            .map(Filter::Every)
            .ok_or_else(|| Error::config("every", "0 (must be > 0)"))
    }

    /// Fire when `predicate` holds for the current state
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&LoopState<S>) -> bool + Send + 'static,
    {
        Filter::Predicate(Box::new(predicate))
    }
}

impl<S> Default for Filter<S> {
    fn default() -> Self {
        Filter::Always
    }
}

impl<S> std::fmt::Debug for Filter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::Always => f.write_str("Always"),
            Filter::Once => f.write_str("Once"),
            Filter::Every(n) => write!(f, "Every({n})"),
            Filter::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Counter an `Every` filter tests for `event`
fn occurrence(event: Event, state: &LoopState<impl Sized>) -> usize {
    if event.is_iteration_event() {
        state.iteration()
    } else if event.is_epoch_event() {
        state.epoch()
    } else {
        1
    }
}

/// A filter plus the bookkeeping it needs across evaluations
pub(crate) struct Gate<S> {
    filter: Filter<S>,
    evaluations: usize,
}

impl<S> Gate<S> {
    pub(crate) fn new(filter: Filter<S>) -> Self {
        Self { filter, evaluations: 0 }
    }

    pub(crate) fn reset(&mut self) {
        self.evaluations = 0;
    }

    /// Evaluate the filter for one candidate firing of `event`
    pub(crate) fn admits(&mut self, event: Event, state: &LoopState<S>) -> bool {
        self.evaluations += 1;
        match &self.filter {
            Filter::Always => true,
            Filter::Once => self.evaluations == 1,
            Filter::Every(n) => {
                let count = occurrence(event, state);
                count > 0 && count % n.get() == 0
            }
            Filter::Predicate(p) => p(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(epoch: usize, iteration: usize) -> LoopState<()> {
        let mut state = LoopState::new(());
        state.begin_epoch(epoch);
        for _ in 0..iteration {
            state.begin_iteration();
        }
        state
    }

    #[test]
    fn test_every_zero_rejected() {
        let err = Filter::<()>::every(0).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_every_counts_epochs_for_epoch_events() {
        let mut gate = Gate::new(Filter::every(2).unwrap());
        let fired: Vec<usize> = (1..=5)
            .filter(|e| gate.admits(Event::EpochCompleted, &state_at(*e, 3)))
            .collect();
        assert_eq!(fired, vec![2, 4]);
    }

    #[test]
    fn test_every_counts_iterations_for_iteration_events() {
        let mut gate = Gate::new(Filter::every(3).unwrap());
        let fired: Vec<usize> = (1..=7)
            .filter(|i| gate.admits(Event::IterationCompleted, &state_at(1, *i)))
            .collect();
        assert_eq!(fired, vec![3, 6]);
    }

    #[test]
    fn test_every_one_fires_for_run_level_events() {
        let mut every_one = Gate::new(Filter::every(1).unwrap());
        let mut every_two = Gate::new(Filter::every(2).unwrap());
        let state = state_at(4, 0);
        assert!(every_one.admits(Event::Completed, &state));
        assert!(!every_two.admits(Event::Completed, &state));
    }

    #[test]
    fn test_once_fires_on_first_evaluation_only() {
        let mut gate = Gate::new(Filter::once());
        let state = state_at(1, 1);
        assert!(gate.admits(Event::IterationCompleted, &state));
        assert!(!gate.admits(Event::IterationCompleted, &state));
        gate.reset();
        assert!(gate.admits(Event::IterationCompleted, &state));
    }

    #[test]
    fn test_predicate_filter() {
        let mut gate = Gate::new(Filter::predicate(|s: &LoopState<()>| s.epoch() > 2));
        assert!(!gate.admits(Event::EpochStarted, &state_at(2, 0)));
        assert!(gate.admits(Event::EpochStarted, &state_at(3, 0)));
    }

    #[test]
    fn test_filter_debug() {
        assert_eq!(format!("{:?}", Filter::<()>::every(5).unwrap()), "Every(5)");
        assert_eq!(format!("{:?}", Filter::<()>::default()), "Always");
    }
}
