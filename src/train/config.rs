//! Run configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Epoch budget and optional per-epoch iteration cap of a run
///
/// Always valid: constructors and deserialization reject non-positive values.
///
/// # Example
///
/// ```rust
/// use bucle::train::RunConfig;
///
/// let config = RunConfig::new(10).unwrap().with_iterations(100).unwrap();
/// assert_eq!(config.epochs(), 10);
/// assert_eq!(config.iterations(), Some(100));
/// assert!(RunConfig::new(0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRunConfig", into = "RawRunConfig")]
pub struct RunConfig {
    epochs: usize,
    iterations: Option<usize>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRunConfig {
    #[serde(default = "default_epochs")]
    epochs: usize,
    #[serde(default)]
    iterations: Option<usize>,
}

fn default_epochs() -> usize {
    1
}

impl RunConfig {
    /// Run `epochs` epochs, each until the data source is exhausted
    pub fn new(epochs: usize) -> Result<Self> {
        if epochs == 0 {
            return Err(Error::config("epochs", "0 (must be > 0)"));
        }
        Ok(Self { epochs, iterations: None })
    }

    /// Cap every epoch at `iterations` batches
    pub fn with_iterations(mut self, iterations: usize) -> Result<Self> {
        if iterations == 0 {
            return Err(Error::config("iterations", "0 (must be > 0)"));
        }
        self.iterations = Some(iterations);
        Ok(self)
    }

    /// Number of epochs
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Per-epoch iteration cap
    pub fn iterations(&self) -> Option<usize> {
        self.iterations
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::ConfigParse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { epochs: default_epochs(), iterations: None }
    }
}

impl TryFrom<RawRunConfig> for RunConfig {
    type Error = Error;

    fn try_from(raw: RawRunConfig) -> Result<Self> {
        let config = Self::new(raw.epochs)?;
        match raw.iterations {
            Some(n) => config.with_iterations(n),
            None => Ok(config),
        }
    }
}

impl From<RunConfig> for RawRunConfig {
    fn from(config: RunConfig) -> Self {
        Self { epochs: config.epochs, iterations: config.iterations }
    }
}
