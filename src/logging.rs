//! Process-wide `tracing` subscriber setup.
//!
//! Console output only, filtered by `RUST_LOG` (defaults to `info`). The
//! engine itself logs through [`crate::log::Logger`]; this installs the
//! backend behind [`crate::log::TracingLogger`].

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber.
///
/// Returns an error if a global subscriber is already set (e.g. when called
/// twice); callers can ignore it.
pub fn init_logging() -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
}
