//! Application configuration: logging and decoder settings.
//!
//! Loaded from a JSON file; every field is optional. `TKM_LOG_LEVEL` and
//! `TKM_LOG_FORMAT` override the file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tkm_totp::totp::DecoderOptions;

use crate::error::AppError;

pub const ENV_LOG_LEVEL: &str = "TKM_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "TKM_LOG_FORMAT";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "plain" | "pretty" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `EnvFilter` directive, e.g. `info` or `tkm_totp=debug,info`.
    pub log_level: String,
    pub log_format: LogFormat,
    pub decoder: DecoderOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            decoder: DecoderOptions::default(),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from `path`, falling back to defaults when the file does not
    /// exist, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(AppError::ConfigIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in
    /// [`AppConfig::load`]). Unparseable formats are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|l| !l.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            match LogFormat::from_str_loose(&raw) {
                Some(format) => self.log_format = format,
                None => log::warn!("Ignoring unknown {} value '{}'", ENV_LOG_FORMAT, raw),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tkm_totp::totp::RecordErrorPolicy;

    #[test]
    fn defaults() {
        let c = AppConfig::default();
        assert_eq!(c.log_level, "info");
        assert_eq!(c.log_format, LogFormat::Text);
        assert_eq!(c.decoder, DecoderOptions::default());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = AppConfig::from_json(r#"{"log_format":"json"}"#).unwrap();
        assert_eq!(c.log_format, LogFormat::Json);
        assert_eq!(c.log_level, "info");

        let c = AppConfig::from_json(
            r#"{"decoder":{"record_errors":"propagate","lenient_continuation":true}}"#,
        )
        .unwrap();
        assert_eq!(c.decoder.record_errors, RecordErrorPolicy::Propagate);
        assert!(c.decoder.lenient_continuation);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(matches!(
            AppConfig::from_json("{not json"),
            Err(AppError::ConfigParse(_))
        ));
    }

    #[test]
    fn overrides_apply() {
        let env: HashMap<&str, &str> =
            [(ENV_LOG_LEVEL, "tkm_totp=debug"), (ENV_LOG_FORMAT, "JSON")].into();
        let mut c = AppConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.log_level, "tkm_totp=debug");
        assert_eq!(c.log_format, LogFormat::Json);
    }

    #[test]
    fn bad_override_values_are_ignored() {
        let env: HashMap<&str, &str> = [(ENV_LOG_LEVEL, "  "), (ENV_LOG_FORMAT, "xml")].into();
        let mut c = AppConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c, AppConfig::default());
    }

    #[test]
    fn serde_roundtrip() {
        let c = AppConfig {
            log_level: "warn".into(),
            log_format: LogFormat::Json,
            decoder: DecoderOptions {
                record_errors: RecordErrorPolicy::Propagate,
                lenient_continuation: false,
            },
        };
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(AppConfig::from_json(&json).unwrap(), c);
    }
}
