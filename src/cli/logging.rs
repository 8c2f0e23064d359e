//! Logging utilities for CLI output

use tracing_subscriber::EnvFilter;

/// Log level for user-facing CLI output
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Normal output level
    Normal,
    /// Verbose output with additional details
    Verbose,
}

impl LogLevel {
    /// Level implied by the `-v` count and `-q` flag
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            LogLevel::Quiet
        } else if verbose > 0 {
            LogLevel::Verbose
        } else {
            LogLevel::Normal
        }
    }
}

/// Print a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}

/// Default `tracing` directive for the given flags
pub(crate) fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    match (quiet, verbose) {
        (true, _) => "bucle=error",
        (false, 0) => "bucle=info",
        (false, 1) => "bucle=debug",
        (false, _) => "bucle=trace",
    }
}

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over the flags. Installing twice is a no-op.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .try_init();

    tracing::debug!("bucle started with verbosity level: {verbose}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_flags() {
        assert_eq!(LogLevel::from_flags(0, false), LogLevel::Normal);
        assert_eq!(LogLevel::from_flags(2, false), LogLevel::Verbose);
        assert_eq!(LogLevel::from_flags(2, true), LogLevel::Quiet);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(0, false), "bucle=info");
        assert_eq!(default_directive(1, false), "bucle=debug");
        assert_eq!(default_directive(3, false), "bucle=trace");
        assert_eq!(default_directive(3, true), "bucle=error");
    }
}
