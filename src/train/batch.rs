//! Batches and data sources

use crate::error::{Error, Result};

/// A training batch: input rows and one target per row
#[derive(Clone, Debug, PartialEq)]
pub struct Batch<X = f64> {
    /// Input rows
    pub inputs: Vec<X>,
    /// Target values, one per input row
    pub targets: Vec<f64>,
}

impl<X> Batch<X> {
    /// Create a batch, rejecting mismatched leading dimensions
    pub fn new(inputs: Vec<X>, targets: Vec<f64>) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::BatchShape { inputs: inputs.len(), targets: targets.len() });
        }
        Ok(Self { inputs, targets })
    }

    /// Number of rows
    pub fn size(&self) -> usize {
        self.inputs.len()
    }

    /// Check if the batch has no rows
    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

/// Lazy, finite or infinite sequence of batches, restarted every epoch
///
/// Exhaustion of the iterator ends the epoch; it is not an error. Any
/// prefetching or backpressure belongs to the implementation, the loop only
/// pulls batches one at a time.
pub trait DataSource {
    /// Batch type produced
    type Batch;

    /// Iterator over one epoch of batches
    type Iter<'a>: Iterator<Item = Self::Batch>
    where
        Self: 'a;

    /// Start a fresh pass over the data
    fn batches(&mut self) -> Self::Iter<'_>;
}

impl<B: Clone> DataSource for Vec<B> {
    type Batch = B;
    type Iter<'a>
        = std::iter::Cloned<std::slice::Iter<'a, B>>
    where
        Self: 'a;

    fn batches(&mut self) -> Self::Iter<'_> {
        self.iter().cloned()
    }
}

/// Data source calling a closure for every epoch
#[derive(Clone, Debug)]
pub struct FromFn<F>(F);

impl<F, I> DataSource for FromFn<F>
where
    F: FnMut() -> I,
    I: IntoIterator,
{
    type Batch = I::Item;
    type Iter<'a>
        = I::IntoIter
    where
        Self: 'a;

    fn batches(&mut self) -> Self::Iter<'_> {
        (self.0)().into_iter()
    }
}

/// Build a data source from a closure returning one epoch of batches
///
/// # Example
///
/// ```rust
/// use bucle::train::{from_fn, DataSource};
///
/// let mut source = from_fn(|| 0..3);
/// assert_eq!(source.batches().collect::<Vec<_>>(), vec![0, 1, 2]);
/// assert_eq!(source.batches().count(), 3);
/// ```
pub fn from_fn<F, I>(f: F) -> FromFn<F>
where
    F: FnMut() -> I,
    I: IntoIterator,
{
    FromFn(f)
}
