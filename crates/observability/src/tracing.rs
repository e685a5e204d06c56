//! Tracing/logging initialization.
//!
//! Engine services emit spans for every operation and events for committed
//! mutations, rejections and skips; this module decides how they are printed.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Build the filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Install the JSON subscriber.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(default_directive: &str) {
    // JSON logs + timestamps; span fields (assignment ids, stock ids) are kept
    // on every event emitted inside them.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_directive))
        .json()
        .with_current_span(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
