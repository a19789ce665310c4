//! Logging setup shared by the binaries

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Environment variable holding a log filter directive
pub const LOG_ENV: &str = "QRWATCH_LOG";

/// Install the global subscriber, writing to stderr.
///
/// The filter comes from `QRWATCH_LOG` when set, else from `default_level`.
pub fn init_logging(default_level: &str) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .try_init()
}
