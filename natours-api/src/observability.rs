//! Tracing initialization

use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Initialize the global tracing subscriber from configuration
///
/// JSON-formatted output with an env-filter seeded from the configured log
/// level; `RUST_LOG` still wins when set.
pub fn init_tracing(config: &Config) {
    let log_level = config.service.log_level.clone();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Tracing initialized for service: {}", config.service.name);
}
