//! Tracing/logging initialization shared by binaries and tests.
//!
//! Log level comes from `RUST_LOG` (default `info`); output format from
//! `LEDGER_LOG_FORMAT` (`json` for machine-readable logs, anything else
//! for plain fmt).

use tracing_subscriber::EnvFilter;

const ENV_LOG_FORMAT: &str = "LEDGER_LOG_FORMAT";

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }
}

/// Initialize with an explicit filter, ignoring the environment. Intended
/// for tests that want deterministic log capture.
pub fn init_with_filter(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_test_writer()
        .try_init();
}
