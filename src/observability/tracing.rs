//! Diagnostics of the service itself.
//!
//! These go to stderr through `tracing-subscriber` and are never routed into
//! the application log channels, so a failing sink can report itself without
//! feeding back into the logger.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("ops_logger={},tower_http=warn", default_level).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
