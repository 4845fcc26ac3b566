//! Logging setup for the `shipwatch` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left to the
//! application. [`init_logging`] installs a formatter writing to stderr so that result
//! tables printed on stdout stay clean.
use tracing_subscriber::EnvFilter;

use crate::alert_errors::AlertError;

/// Build the event filter: `RUST_LOG` when set, `default_level` otherwise.
pub fn build_filter(default_level: &str) -> Result<EnvFilter, AlertError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| AlertError::InvalidParameter(format!("log level '{default_level}': {e}")))
}

/// Install the global subscriber
///
/// Arguments
/// -----------------
/// * `default_level`: filter directive used when `RUST_LOG` is unset (`"info"`, `"shipwatch=debug"`, ...)
///
/// Return
/// ----------
/// * an error if the directive is invalid or a global subscriber is already installed
pub fn init_logging(default_level: &str) -> Result<(), AlertError> {
    let filter = build_filter(default_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AlertError::LoggingInit(e.to_string()))
}
