//! Application layer for the TOTP token manager.
//!
//! Wires configuration and logging around the `tkm-totp` decoder and
//! exposes the import service used by the anonymous and per-user paths.

pub mod config;
pub mod error;
pub mod import;
pub mod logging;

use std::path::Path;

pub use config::{AppConfig, LogFormat};
pub use error::AppError;
pub use import::{ImportScope, ImportService, ImportServiceState, ImportSummary, ImportedTotp};

/// Load configuration, install logging and build the shared import service.
pub fn bootstrap(config_path: impl AsRef<Path>) -> Result<(AppConfig, ImportServiceState), AppError> {
    let config = AppConfig::load(config_path)?;
    logging::init_logging(&config)?;
    log::info!(
        "Import service ready (record errors: {:?}, lenient continuation: {})",
        config.decoder.record_errors,
        config.decoder.lenient_continuation
    );
    let service = ImportService::shared(config.decoder.clone());
    Ok((config, service))
}
