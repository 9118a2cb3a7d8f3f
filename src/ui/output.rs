//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Query results are JSON on stdout. Human-facing messages and log lines go
//! to stderr so stdout stays machine-readable. Messages respect the quiet
//! flag; errors are always shown.

use std::fmt::Display;

use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "DATATHREAD_LOG";

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }

    /// Default log filter for this verbosity.
    pub fn log_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Debug => "datathread=debug,info",
        }
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `DATATHREAD_LOG` takes precedence over the verbosity default. Calling
/// this more than once keeps the first subscriber.
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Render a value as JSON.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Print a value as JSON on stdout (always shown).
pub fn emit<T: Serialize>(value: &T, pretty: bool) -> serde_json::Result<()> {
    println!("{}", to_json(value, pretty)?);
    Ok(())
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}
