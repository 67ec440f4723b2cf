//! Tracing setup for the command-line binary.
//!
//! Log output goes to stderr so stdout stays reserved for command results.

use std::time::{Duration, Instant};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides the default `info`
/// filter. Repeated calls are no-ops.
pub fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true);

    let _ = if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(base.compact())
            .try_init()
    };
}

/// Runs `f` and emits a warning when it takes longer than `max`.
pub fn warn_if_slow<T>(label: &str, max: Duration, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
