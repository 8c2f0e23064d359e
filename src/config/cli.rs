//! Command-line interface types

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use super::schema::{CheckpointSpec, FitSpec};
use crate::error::Result;
use crate::train::RunConfig;

/// Bucle: event-driven training loops
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "bucle")]
#[command(version)]
#[command(about = "Event-driven training loop with handlers, metrics and checkpoints")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Fit the demo linear model from a YAML configuration
    Fit(FitArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the fit command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct FitArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override learning rate
    #[arg(short, long)]
    pub lr: Option<f64>,

    /// Override checkpoint directory
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Resume from the latest checkpoint in the checkpoint directory
    #[arg(short, long)]
    pub resume: bool,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to YAML configuration file
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Print the resolved configuration
    #[arg(short, long)]
    pub detailed: bool,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> std::result::Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a FitSpec
pub fn apply_overrides(spec: &mut FitSpec, args: &FitArgs) -> Result<()> {
    if let Some(epochs) = args.epochs {
        let mut run = RunConfig::new(epochs)?;
        if let Some(iterations) = spec.run.iterations() {
            run = run.with_iterations(iterations)?;
        }
        spec.run = run;
    }
    if let Some(lr) = args.lr {
        spec.optimizer.lr = lr;
    }
    if let Some(dir) = &args.checkpoint_dir {
        match spec.checkpoint.as_mut() {
            Some(checkpoint) => checkpoint.dir = dir.clone(),
            None => {
                spec.checkpoint =
                    Some(CheckpointSpec { dir: dir.clone(), every: 1, save_best: false })
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fit_command() {
        let cli = parse_args(["bucle", "fit", "config.yaml", "--epochs", "5", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        match cli.command {
            Command::Fit(args) => {
                assert_eq!(args.config, PathBuf::from("config.yaml"));
                assert_eq!(args.epochs, Some(5));
                assert!(!args.resume);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_validate_command() {
        let cli = parse_args(["bucle", "-q", "validate", "config.yaml", "--detailed"]).unwrap();
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Validate(ValidateArgs { detailed: true, .. })));
    }

    #[test]
    fn test_missing_config_is_rejected() {
        assert!(parse_args(["bucle", "fit"]).is_err());
    }

    #[test]
    fn test_apply_overrides() {
        let mut spec = FitSpec::default();
        spec.run = RunConfig::new(3).unwrap().with_iterations(2).unwrap();
        let args = FitArgs {
            config: "c.yaml".into(),
            epochs: Some(7),
            lr: Some(0.01),
            checkpoint_dir: Some("out".into()),
            resume: false,
        };

        apply_overrides(&mut spec, &args).unwrap();

        assert_eq!(spec.run.epochs(), 7);
        assert_eq!(spec.run.iterations(), Some(2));
        assert_eq!(spec.optimizer.lr, 0.01);
        assert_eq!(spec.checkpoint.map(|c| c.dir), Some(PathBuf::from("out")));
    }

    #[test]
    fn test_zero_epochs_override_rejected() {
        let mut spec = FitSpec::default();
        let args = FitArgs {
            config: "c.yaml".into(),
            epochs: Some(0),
            lr: None,
            checkpoint_dir: None,
            resume: false,
        };
        assert!(apply_overrides(&mut spec, &args).is_err());
    }
}
