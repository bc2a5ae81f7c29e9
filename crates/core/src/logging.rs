//! Structured logging infrastructure.
//!
//! Centralized `tracing` initialization with support for structured JSON
//! output and environment-based filtering.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the logging system with human-readable output.
///
/// Log level can be configured via the `RUST_LOG` environment variable.
/// If not set, defaults to `info` level.
///
/// # Example
/// ```no_run
/// use onboard_core::logging;
///
/// logging::init();
/// tracing::info!("Application started");
/// ```
pub fn init() {
    init_from(&LoggingConfig::default());
}

/// Initialize the logging system with JSON output for production environments.
///
/// # Example
/// ```no_run
/// use onboard_core::logging;
///
/// logging::init_json();
/// tracing::info!(service = "onboard-api", "Service started");
/// ```
pub fn init_json() {
    init_from(&LoggingConfig {
        format: LogFormat::Json,
        ..LoggingConfig::default()
    });
}

/// Initialize logging from the `[logging]` configuration section.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_from(config: &LoggingConfig) {
    let filter = build_filter(&config.level);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Plain => registry
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .init(),
    }
}

fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
