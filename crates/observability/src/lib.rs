//! Process-wide tracing setup shared by every binary embedding the engine.

/// Initialize structured logging with the `info` default filter.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Subscriber construction (JSON formatter, `RUST_LOG` filter).
pub mod tracing;
