//! Tracing setup shared by binaries and test harnesses

use tracing_subscriber::EnvFilter;

/// Initialize tracing with the default "info" level.
///
/// `RUST_LOG` takes precedence when set. Safe to call more than once;
/// subsequent calls are no-ops.
pub fn init_tracing() {
    init_tracing_with_level(None);
}

/// Initialize tracing with an explicit base level (e.g. "debug").
pub fn init_tracing_with_level(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
