//! Bucle: an event-driven training loop
//!
//! A [`train::Loop`] drives a user-supplied step function over epochs and
//! batches, folds metrics with accumulators after every step, and dispatches
//! lifecycle events to handlers that can halt the current epoch or the whole
//! run. Checkpoint stores, YAML configuration and a small CLI sit around the
//! engine.
//!
//! # Modules
//!
//! - [`train`]: loop driver, events, handlers, filters, metrics
//! - [`storage`]: checkpoint stores
//! - [`config`]: YAML fit configuration and CLI types
//! - [`linear`]: demo linear regression used by the CLI

pub mod cli;
pub mod config;
pub mod error;
pub mod linear;
pub mod storage;
pub mod train;

pub use error::{BoxError, Error, Result};
