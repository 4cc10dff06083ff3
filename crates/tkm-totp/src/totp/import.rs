//! QR text import: detects the format and produces credentials.
//!
//! Supported formats:
//! - Google Authenticator migration payloads (`otpauth-migration://offline?data=…`)
//! - Single `otpauth://totp/…` URIs

use crate::totp::migration::MigrationDecoder;
use crate::totp::types::*;
use crate::totp::uri;

/// Detect the format of scanned QR text.
pub fn detect_format(data: &str) -> Option<QrFormat> {
    let trimmed = data.trim();

    // otpauth-migration:// first (before otpauth://)
    if trimmed.starts_with(uri::MIGRATION_PREFIX) {
        return Some(QrFormat::GoogleAuthMigration);
    }
    if trimmed.starts_with(uri::OTPAUTH_PREFIX) {
        return Some(QrFormat::OtpAuthUri);
    }
    None
}

/// Parse scanned QR text into credentials.
///
/// An empty credential list is returned as `Ok`; deciding whether that is
/// a failure is up to the caller.
pub fn parse_qr_data(data: &str, options: &DecoderOptions) -> Result<ImportResult, TotpError> {
    match detect_format(data) {
        Some(QrFormat::GoogleAuthMigration) => import_google_auth_migration(data, options),
        Some(QrFormat::OtpAuthUri) => import_otpauth_uri(data),
        None => Err(TotpError::new(
            TotpErrorKind::UnsupportedFormat,
            "Unsupported QR code format",
        )),
    }
}

fn import_google_auth_migration(
    data: &str,
    options: &DecoderOptions,
) -> Result<ImportResult, TotpError> {
    let payload = uri::parse_migration_uri(data)?;
    let batch = MigrationDecoder::new(options.clone()).decode(&payload)?;

    let warnings = batch
        .dropped
        .iter()
        .map(|d| format!("Entry {}: {}", d.index + 1, d.reason))
        .collect();

    Ok(ImportResult {
        format: QrFormat::GoogleAuthMigration,
        total_found: batch.total_found(),
        imported: batch.credentials.len(),
        skipped: batch.dropped.len(),
        warnings,
        credentials: batch.credentials,
    })
}

fn import_otpauth_uri(data: &str) -> Result<ImportResult, TotpError> {
    let credential = uri::parse_otpauth_uri(data)?;
    Ok(ImportResult {
        format: QrFormat::OtpAuthUri,
        total_found: 1,
        imported: 1,
        skipped: 0,
        warnings: vec![],
        credentials: vec![credential],
    })
}
