//! CLI command implementations

mod fit;
mod validate;

use crate::cli::LogLevel;
use crate::config::{Cli, Command};
use crate::error::Result;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Fit(args) => fit::run_fit(args, log_level),
        Command::Validate(args) => validate::run_validate(args, log_level),
    }
}
