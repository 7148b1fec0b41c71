// Logging module for structured logging using the tracing crate

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::AppError;

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - Filtering from `RUST_LOG` when set, otherwise from `config.level`
/// - Human-readable or JSON lines, per `config.format`
/// - Output to stderr, so exported images piped to stdout stay clean
///
/// Calling it again after a subscriber is installed is a no-op.
///
/// # Errors
///
/// Returns `AppError::Logging` if the configured level is not a valid filter.
///
/// # Examples
///
/// ```
/// use photomark::config::LoggingConfig;
/// use photomark::logging::init_subscriber;
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), AppError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| AppError::Logging(format!("invalid level '{}': {}", config.level, e)))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.with_target(false).try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
    Ok(())
}
