//! Structured logging initialisation.
//!
//! Logs go to stderr, so that the report on stdout stays machine readable.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Initialise the logging subsystem.
///
/// The RUST_LOG environment variable takes precedence over the configured level. Calling this more
/// than once keeps the first subscriber.
pub fn init(config: &LoggingConfig) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(config.level.as_str())
    };

    let layer = fmt::layer().with_writer(std::io::stderr).with_thread_names(true);
    let result = if config.timestamps {
        tracing_subscriber::registry().with(filter).with(layer).try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.without_time())
            .try_init()
    };
    if let Err(e) = result {
        tracing::debug!("logging already initialised: {e}");
    }
}
