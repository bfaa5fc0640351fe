//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for a crew verbosity level
///
/// 0 keeps warnings only, 1 adds crew and task progress, 2 also logs every
/// tool call and LLM round trip.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "info,crew_runtime=debug,crew_process=debug,stock_newsletter=debug",
    }
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` wins when set; otherwise the filter follows `verbosity`.
/// Calling this more than once is harmless.
pub fn init_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(verbosity > 1))
        .try_init();
}
