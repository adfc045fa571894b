//! Logging setup for toppharma.
//!
//! Installs the tracing subscriber used by the server and the CLI.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above; HTTP request traces are hidden.
    #[default]
    Normal,
    /// Debug and above, with one line per HTTP request.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Level for the crate's own events.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// The filter directive used when `RUST_LOG` is unset.
    ///
    /// `tower_http` request spans are kept at `WARN` until `-v`.
    #[must_use]
    pub fn directive(&self) -> String {
        let level = self.to_level_filter();
        let http = match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose | Self::Trace => level,
        };
        format!("toppharma={level},tower_http={http}")
    }
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbosity` when set.
///
/// # Examples
///
/// ```no_run
/// use toppharma::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    // Already installed (tests, repeated calls) is fine.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_request_traces_only_when_verbose() {
        assert_eq!(Verbosity::Quiet.directive(), "toppharma=ERROR,tower_http=ERROR");
        assert_eq!(Verbosity::Normal.directive(), "toppharma=INFO,tower_http=WARN");
        assert_eq!(Verbosity::Verbose.directive(), "toppharma=DEBUG,tower_http=DEBUG");
        assert_eq!(Verbosity::Trace.directive(), "toppharma=TRACE,tower_http=TRACE");
    }

    #[test]
    fn test_init_logging_with_all_verbosity_levels() {
        // Only the first call installs a subscriber; the rest must not panic.
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Verbose);
        init_logging(Verbosity::Trace);
    }
}
