//! Structured logging bootstrap.
//!
//! `tracing`/`tracing-subscriber` give operators a leveled, filterable log
//! stream independent of the human-facing output sink — the JSON-line
//! filter emits a structured event per dropped line, and the connection/
//! session layers emit lifecycle events (spawn, initialize, close, fatal
//! error) that `eprintln!` alone can't let a caller subscribe to or filter.

use tracing_subscriber::EnvFilter;

/// Install a global `tracing` subscriber reading its filter from
/// `RUST_LOG` (falling back to `info` for this crate, `warn` elsewhere).
/// Call once, from the demo binary's `main`. Safe to skip entirely in
/// library use — every `tracing::*!` call is a no-op without a subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,mitto=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
