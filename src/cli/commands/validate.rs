//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{load_config, FitSpec, ValidateArgs};
use crate::error::Result;

/// Format a configuration summary
pub fn format_summary(spec: &FitSpec) -> String {
    let mut lines = vec![
        "Configuration Summary:".to_string(),
        format!("  Epochs: {}", spec.run.epochs()),
    ];
    if let Some(iterations) = spec.run.iterations() {
        lines.push(format!("  Iterations per epoch: {iterations}"));
    }
    lines.push(format!(
        "  Data: {} samples, batch size {}, y = {} * x + {}",
        spec.data.samples, spec.data.batch_size, spec.data.slope, spec.data.intercept
    ));
    lines.push(format!("  Learning rate: {}", spec.optimizer.lr));
    if let Some(plateau) = &spec.optimizer.plateau {
        lines.push(format!(
            "  Reduce on plateau: factor {}, patience {}",
            plateau.factor, plateau.patience
        ));
    }
    if let Some(checkpoint) = &spec.checkpoint {
        lines.push(format!(
            "  Checkpoints: {} every {} epochs{}",
            checkpoint.dir.display(),
            checkpoint.every,
            if checkpoint.save_best { " (best only)" } else { "" }
        ));
    }
    if let Some(early) = &spec.early_stopping {
        lines.push(format!("  Early stopping: patience {}", early.patience));
    }
    lines.join("\n")
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<()> {
    log(level, LogLevel::Normal, &format!("Validating config: {}", args.config.display()));

    let spec = load_config(&args.config)?;

    log(level, LogLevel::Normal, "Configuration is valid");
    if args.detailed {
        log(level, LogLevel::Normal, &format_summary(&spec));
    }
    Ok(())
}
