//! Tracing subscriber initialization for `skregd` and its background jobs.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. Respects `RUST_LOG` via
/// [`EnvFilter::try_from_default_env`]; `verbose` only changes the default
/// level used when `RUST_LOG` is unset.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let default_directive = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|e| e.into())
}
