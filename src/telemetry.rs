//! Structured logging bootstrap.
//!
//! Services emit `tracing` events with explicit fields; this module only
//! installs a subscriber for binaries and tooling embedding the crate.

use crate::config::QuestbankSettings;
use tracing_subscriber::{EnvFilter, fmt};

/// Default filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Installs the global `tracing` subscriber.
///
/// Honours `RUST_LOG`, falling back to [`DEFAULT_FILTER`]. Returns `false`
/// when a subscriber was already installed, which is harmless in tests.
#[must_use]
pub fn init_tracing(json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = installed {
        tracing::warn!(error = %err, "tracing init failed");
        return false;
    }
    true
}

/// Installs the subscriber using the `log_json` setting.
#[must_use]
pub fn init_from_settings(settings: &QuestbankSettings) -> bool {
    init_tracing(settings.log_json())
}
