//! Semantic validation of a parsed [`FitSpec`]

use super::schema::FitSpec;
use crate::error::{Error, Result};

fn positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::config(field, "0 (must be > 0)"));
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::config(field, format!("{value} (must be finite)")));
    }
    Ok(())
}

/// Validate a fit configuration before any run starts
///
/// `run` is validated while parsing; this checks everything else.
pub fn validate_spec(spec: &FitSpec) -> Result<()> {
    positive("data.samples", spec.data.samples)?;
    positive("data.batch_size", spec.data.batch_size)?;
    if spec.data.batch_size > spec.data.samples {
        return Err(Error::config(
            "data.batch_size",
            format!("{} exceeds data.samples ({})", spec.data.batch_size, spec.data.samples),
        ));
    }
    finite("data.slope", spec.data.slope)?;
    finite("data.intercept", spec.data.intercept)?;

    finite("optimizer.lr", spec.optimizer.lr)?;
    if spec.optimizer.lr <= 0.0 {
        return Err(Error::config("optimizer.lr", format!("{} (must be > 0)", spec.optimizer.lr)));
    }
    if let Some(plateau) = &spec.optimizer.plateau {
        if !(plateau.factor > 0.0 && plateau.factor < 1.0) {
            return Err(Error::config(
                "optimizer.plateau.factor",
                format!("{} (must be in (0, 1))", plateau.factor),
            ));
        }
        positive("optimizer.plateau.patience", plateau.patience)?;
        finite("optimizer.plateau.min_lr", plateau.min_lr)?;
    }

    if let Some(checkpoint) = &spec.checkpoint {
        positive("checkpoint.every", checkpoint.every)?;
        if checkpoint.dir.as_os_str().is_empty() {
            return Err(Error::config("checkpoint.dir", "must not be empty"));
        }
    }

    if let Some(early) = &spec.early_stopping {
        positive("early_stopping.patience", early.patience)?;
        finite("early_stopping.min_delta", early.min_delta)?;
    }

    positive("logging.every", spec.logging.every)?;
    Ok(())
}
