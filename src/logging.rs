//! Logging initialisation.
//!
//! Installs a `tracing-subscriber` fmt subscriber (text or JSON) filtered by
//! the configured `EnvFilter` directive. Records emitted through the `log`
//! facade by `tkm-totp` are bridged into the same subscriber.

use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LogFormat};
use crate::error::AppError;

/// Build the filter for `config.log_level`.
pub fn build_filter(config: &AppConfig) -> Result<EnvFilter, AppError> {
    EnvFilter::try_new(&config.log_level).map_err(|_| AppError::LogFilter(config.log_level.clone()))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &AppConfig) -> Result<(), AppError> {
    let filter = build_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| AppError::Logging(e.to_string()))?;
    tracing::debug!(format = ?config.log_format, level = %config.log_level, "Logging initialised");
    Ok(())
}
