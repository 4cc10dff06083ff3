//! Application-level error type.

use tkm_totp::totp::{TotpError, TotpErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Import(#[from] TotpError),
    #[error("No valid TOTP entries found")]
    NoValidEntries,
    #[error("Failed to read config file '{path}': {source}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("Invalid log filter '{0}'")]
    LogFilter(String),
    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

impl AppError {
    /// Message suitable for showing to the person who scanned the code.
    pub fn user_message(&self) -> String {
        match self {
            Self::Import(e) => match e.kind {
                TotpErrorKind::CorruptPayload | TotpErrorKind::InvalidText => {
                    "Unsupported or corrupted QR code".to_string()
                }
                TotpErrorKind::UnsupportedFormat => "Unsupported QR code format".to_string(),
                _ => format!("Failed to import TOTP: {}", e.message),
            },
            Self::NoValidEntries => "No valid TOTP entries found".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_string()
    }
}
