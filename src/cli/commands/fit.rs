//! Fit command implementation

use std::fs;

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{apply_overrides, load_config, validate_spec, FitArgs};
use crate::error::{Error, Result};
use crate::linear::{build_loop, initial_state, synthetic_batches};
use crate::train::format_metrics;

pub fn run_fit(args: FitArgs, level: LogLevel) -> Result<()> {
    log(level, LogLevel::Normal, &format!("Loading config: {}", args.config.display()));

    let mut spec = load_config(&args.config)?;
    apply_overrides(&mut spec, &args)?;
    validate_spec(&spec)?;

    let batches = synthetic_batches(&spec)?;
    let (mut training, history) = build_loop(&spec)?;
    let state = initial_state(&spec, args.resume)?;

    log(
        level,
        LogLevel::Verbose,
        &format!(
            "  {} batches, epochs {}..={}",
            batches.len(),
            state.epoch() + 1,
            spec.run.epochs()
        ),
    );

    let outcome = training.resume(batches, state, &spec.run)?;
    let model = outcome.state.step_state.params;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "{:?} after epoch {}: weight={:.4} bias={:.4} ({:.2}s)",
            outcome.termination(),
            outcome.state.epoch(),
            model.weight,
            model.bias,
            outcome.elapsed_secs
        ),
    );
    log(level, LogLevel::Normal, &format!("  {}", format_metrics(outcome.state.metrics())));

    if let Some(path) = &spec.logging.history {
        fs::write(path, history.to_json()?)
            .map_err(|e| Error::io(format!("writing history {}", path.display()), e))?;
        log(level, LogLevel::Verbose, &format!("  History written to {}", path.display()));
    }
    Ok(())
}
