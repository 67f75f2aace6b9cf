//! Tracing subscriber setup for the binary and tests

use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Test subscriber: `TEST_LOG`, then `RUST_LOG`, then `warn`; output captured per test.
pub fn init_for_tests() {
    let filter = std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .try_init()
        .ok();
}
