pub use tracing::{debug, error, info, warn, trace, instrument};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};
use tracing_subscriber::util::TryInitError;

/// Installs the global subscriber, panicking if one is already set.
pub fn init() {
    if let Err(e) = try_init("info") {
        panic!("failed to install tracing subscriber: {e}");
    }
}

/// Installs the global subscriber. `default_level` applies when `RUST_LOG` is unset.
pub fn try_init(default_level: &str) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let is_debug = env_filter.to_string().contains("debug") ||
                   std::env::var("RUST_LOG").unwrap_or_default().contains("debug");

    // batch stages are spans, so closing them prints per-stage durations
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(if is_debug {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
}
