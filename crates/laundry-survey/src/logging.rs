//! Logging setup for the `lsurvey` binary.
//!
//! Events are written to stderr so that `list --format json` and
//! `config show --json` keep stdout machine-readable.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the CLI logs, picked from `-q` and `-v` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// `-q`: errors only.
    Quiet,
    /// No flag: submissions, exports and warnings.
    #[default]
    Normal,
    /// `-v`: every gateway round trip.
    Verbose,
    /// `-vv` and up.
    Trace,
}

impl Verbosity {
    /// Resolve the command-line flags. `-q` wins over any `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed level that is let through.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Directive used when `RUST_LOG` is unset. Only this crate's events pass;
/// dependencies such as `reqwest` and `rusqlite` stay silent.
#[must_use]
pub fn default_filter(verbosity: Verbosity) -> String {
    format!("laundry_survey={}", verbosity.to_level_filter())
}

/// Install the stderr subscriber.
///
/// `RUST_LOG`, when set and parseable, replaces the flag-derived filter
/// entirely. Calling this twice is harmless; the second call is ignored.
///
/// ```no_run
/// use laundry_survey::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init();
}
