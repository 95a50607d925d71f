//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
//! the `-v` flags.

use crate::context::VerbosityLevel;
use tracing_subscriber::EnvFilter;

/// Filter directives for a verbosity level.
pub fn default_directives(verbosity: VerbosityLevel) -> &'static str {
    match verbosity {
        VerbosityLevel::Normal => "warn",
        VerbosityLevel::Verbose => "warn,azlook=debug,libazlook=debug",
        VerbosityLevel::Trace => "info,azlook=trace,libazlook=trace",
    }
}

/// Installs the global subscriber. Safe to call more than once.
pub fn init(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(verbosity >= VerbosityLevel::Trace)
        .try_init();
}
