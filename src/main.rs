//! Bucle CLI
//!
//! Fits a demo linear model with the bucle training loop.
//!
//! # Usage
//!
//! ```bash
//! # Fit from config
//! bucle fit config.yaml
//!
//! # Fit with overrides, resuming from the latest checkpoint
//! bucle fit config.yaml --epochs 50 --lr 0.05 --resume
//!
//! # Validate config
//! bucle validate config.yaml --detailed
//! ```

use bucle::cli::{init_tracing, run_command, Cli};
use clap::Parser;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
