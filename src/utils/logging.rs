// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Used when `RUST_LOG` is unset: our own events at `info`, chatty
/// dependencies only when something goes wrong.
pub const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn,pdf_extract=error";

/// Installs the global subscriber. `RUST_LOG` overrides [`DEFAULT_FILTER`].
/// Calling it twice is harmless.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if fmt().with_env_filter(filter).with_target(false).try_init().is_ok() {
        tracing::debug!("Logging initialised");
    }
}
