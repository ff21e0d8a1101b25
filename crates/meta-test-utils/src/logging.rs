use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Route tracing output through the test harness.
///
/// Uses `RUST_LOG` when set and `warn` otherwise. Safe to call from every
/// test; only the first call installs a subscriber.
pub fn init() {
    let fmt_layer = fmt::layer()
        .with_test_writer()
        .with_target(true)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
