//! Import service: turns scanned QR text into records ready to persist.
//!
//! Decoding is delegated to `tkm_totp`; this layer attaches ownership,
//! identifiers and timestamps, and rejects scans that yield nothing.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tkm_totp::totp::{parse_qr_data, DecoderOptions, OtpCredential, QrFormat};

use crate::error::AppError;

/// Shared service state.
pub type ImportServiceState = Arc<ImportService>;

/// Who the imported credentials belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "userId", rename_all = "camelCase")]
pub enum ImportScope {
    Anonymous,
    User(String),
}

impl ImportScope {
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(id),
        }
    }
}

impl fmt::Display for ImportScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::User(id) => write!(f, "user:{}", id),
        }
    }
}

/// One credential, shaped for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedTotp {
    pub id: Uuid,
    /// `None` for anonymous imports.
    pub owner: Option<String>,
    /// Label with the issuer appended, e.g. `alice (GitHub)`.
    pub user_info: String,
    /// Base32, unpadded.
    pub secret: String,
    pub created: DateTime<Utc>,
}

impl ImportedTotp {
    fn from_credential(scope: &ImportScope, credential: &OtpCredential, created: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: scope.owner().map(str::to_string),
            user_info: credential.display_label(),
            secret: credential.secret.clone(),
            created,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub format: QrFormat,
    pub count: usize,
    pub entries: Vec<ImportedTotp>,
    pub warnings: Vec<String>,
}

pub struct ImportService {
    options: DecoderOptions,
}

impl Default for ImportService {
    fn default() -> Self {
        Self::new(DecoderOptions::default())
    }
}

impl ImportService {
    pub fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    /// Create a service wrapped in `Arc` for sharing across tasks.
    pub fn shared(options: DecoderOptions) -> ImportServiceState {
        Arc::new(Self::new(options))
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    //  Import
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Decode `qr` and build one [`ImportedTotp`] per credential.
    ///
    /// Fails with [`AppError::NoValidEntries`] when the scan decodes but
    /// nothing survives.
    pub fn import(&self, scope: &ImportScope, qr: &str) -> Result<ImportSummary, AppError> {
        let span = tracing::info_span!("import", scope = %scope);
        let _guard = span.enter();

        let result = parse_qr_data(qr, &self.options).map_err(|e| {
            tracing::warn!(kind = ?e.kind, error = %e, "QR decode failed");
            e
        })?;

        for warning in &result.warnings {
            tracing::warn!(format = ?result.format, "{}", warning);
        }

        if result.credentials.is_empty() {
            tracing::warn!(
                found = result.total_found,
                skipped = result.skipped,
                "No valid TOTP entries"
            );
            return Err(AppError::NoValidEntries);
        }

        let created = Utc::now();
        let entries: Vec<ImportedTotp> = result
            .credentials
            .iter()
            .map(|c| ImportedTotp::from_credential(scope, c, created))
            .collect();

        tracing::info!(
            format = ?result.format,
            imported = entries.len(),
            skipped = result.skipped,
            "TOTP import complete"
        );

        Ok(ImportSummary {
            format: result.format,
            count: entries.len(),
            entries,
            warnings: result.warnings,
        })
    }
}
