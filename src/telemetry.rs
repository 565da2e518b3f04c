//! Structured logging setup.

use crate::config::LoggingSettings;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Failure to install the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter does not parse.
    #[error("invalid log filter '{filter}': {source}")]
    Filter {
        /// Filter text.
        filter: String,
        /// Parser error.
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Builds the event filter: `RUST_LOG` when set, else the configured
/// default.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the configured filter is invalid.
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter, TelemetryError> {
    if let Ok(from_env) = EnvFilter::try_from_default_env() {
        return Ok(from_env);
    }
    EnvFilter::try_new(&settings.filter).map_err(|source| TelemetryError::Filter {
        filter: settings.filter.clone(),
        source,
    })
}

/// Installs the global `fmt` subscriber, JSON formatted when configured.
///
/// # Errors
///
/// Returns a [`TelemetryError`] when the filter is invalid or a subscriber
/// is already installed.
pub fn init_tracing(settings: &LoggingSettings) -> Result<(), TelemetryError> {
    let filter = env_filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if settings.json {
        builder.json().try_init().map_err(TelemetryError::Install)
    } else {
        builder.try_init().map_err(TelemetryError::Install)
    }
}
