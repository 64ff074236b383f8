//! Logging setup for applications using typed-query.
//!
//! The library itself only emits `tracing` events; this installs a subscriber
//! that writes them to stderr.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Initializes logging to stderr.
///
/// Honors `RUST_LOG`, falling back to `info`. Returns false if a global
/// subscriber was already installed, in which case nothing changes.
pub fn init_stderr_logging() -> bool {
    init_with_default_filter(DEFAULT_FILTER)
}

/// Initializes logging to stderr with a custom fallback filter (e.g. `"typed_query=debug"`).
pub fn init_with_default_filter(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
