//! Core types for OTP import: credentials, decoder options and errors.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
    Md5,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
            Self::Md5 => write!(f, "MD5"),
        }
    }
}

impl Algorithm {
    /// Map the migration payload's algorithm enum (0 = unspecified).
    pub fn from_migration(value: u64) -> Self {
        match value {
            2 => Self::Sha256,
            3 => Self::Sha512,
            4 => Self::Md5,
            _ => Self::Sha1,
        }
    }

    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            "MD5" => Some(Self::Md5),
            _ => None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whether a credential uses time-based or counter-based OTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Totp,
    Hotp,
}

impl Default for OtpType {
    fn default() -> Self {
        Self::Totp
    }
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "totp"),
            Self::Hotp => write!(f, "hotp"),
        }
    }
}

impl OtpType {
    /// Map the migration payload's type enum (0 = unspecified, 1 = HOTP).
    pub fn from_migration(value: u64) -> Self {
        if value == 1 {
            Self::Hotp
        } else {
            Self::Totp
        }
    }
}

/// Map the migration payload's digit-count enum (2 = eight digits).
pub fn digits_from_migration(value: u64) -> u8 {
    if value == 2 {
        8
    } else {
        6
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Credential
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A single OTP credential recovered from a QR code.
///
/// `label` and `secret` are never empty for a credential produced by this
/// crate. Ownership passes to the caller, which assigns an identifier and
/// persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpCredential {
    /// Account label (e.g. "alice@example.com").
    pub label: String,
    /// Issuer (e.g. "GitHub"); `None` when absent or empty.
    pub issuer: Option<String>,
    /// Base-32 encoded secret, uppercase, unpadded.
    pub secret: String,
    pub algorithm: Algorithm,
    /// Number of digits in the generated code (6 or 8).
    pub digits: u8,
    pub otp_type: OtpType,
    /// Counter value (HOTP only).
    pub counter: u64,
}

impl OtpCredential {
    /// Create a TOTP credential with default parameters.
    pub fn new(label: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            issuer: None,
            secret: secret.into(),
            algorithm: Algorithm::default(),
            digits: 6,
            otp_type: OtpType::Totp,
            counter: 0,
        }
    }

    /// Builder: set issuer. An empty issuer is treated as absent.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        self.issuer = if issuer.is_empty() { None } else { Some(issuer) };
        self
    }

    /// Display string stored by the product: `"label (issuer)"`, or just
    /// `"label"` without an issuer.
    pub fn display_label(&self) -> String {
        match &self.issuer {
            Some(iss) => format!("{} ({})", self.label, iss),
            None => self.label.clone(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Decoder options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What to do with a record whose label or issuer is not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorPolicy {
    /// Drop the record and keep decoding the rest of the payload.
    #[default]
    Skip,
    /// Abort the whole decode with the text error.
    Propagate,
}

/// Tunables for the migration decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    pub record_errors: RecordErrorPolicy,
    /// Accept any continuation byte and keep only its low six bits.
    /// When `false`, continuation bytes outside 0x80–0xBF are rejected.
    pub lenient_continuation: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Import result
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Recognised QR text formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QrFormat {
    /// `otpauth-migration://offline?data=…` bulk export.
    GoogleAuthMigration,
    /// Single `otpauth://totp/…` key URI.
    OtpAuthUri,
}

impl fmt::Display for QrFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GoogleAuthMigration => write!(f, "otpauth-migration"),
            Self::OtpAuthUri => write!(f, "otpauth"),
        }
    }
}

/// Outcome of parsing one piece of QR text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub format: QrFormat,
    /// Number of records seen in the payload, kept or not.
    pub total_found: usize,
    pub imported: usize,
    /// Records dropped for a missing secret/label or undecodable text.
    pub skipped: usize,
    /// Human-readable notes about dropped records.
    pub warnings: Vec<String>,
    pub credentials: Vec<OtpCredential>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Decoder errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Failure while walking a migration payload.
///
/// Offsets are byte positions within the buffer handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MigrationError {
    /// The buffer ended before a varint's terminating byte.
    #[error("truncated varint at offset {offset}")]
    TruncatedVarint { offset: usize },
    /// A varint longer than 64 bits.
    #[error("varint at offset {offset} overflows 64 bits")]
    VarintOverflow { offset: usize },
    /// A length-delimited field claims more bytes than remain.
    #[error("invalid length-delimited field length {length} at offset {offset} ({remaining} bytes remaining)")]
    InvalidFieldLength {
        offset: usize,
        length: u64,
        remaining: usize,
    },
    /// A multi-byte UTF-8 sequence cut short by the end of the field.
    #[error("incomplete {expected}-byte UTF-8 sequence at offset {offset}")]
    IncompleteSequence { offset: usize, expected: usize },
    /// A byte or code point that cannot appear in UTF-8 text.
    #[error("invalid UTF-8 at offset {offset} (value 0x{value:x})")]
    InvalidUtf8 { offset: usize, value: u32 },
}

impl MigrationError {
    /// Structural errors corrupt the wire format itself; scanning cannot
    /// continue past them.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::TruncatedVarint { .. }
                | Self::VarintOverflow { .. }
                | Self::InvalidFieldLength { .. }
        )
    }

    /// Shift the reported offset by `base`, turning a position inside a
    /// sub-slice into a position inside the enclosing buffer.
    pub fn offset_by(self, base: usize) -> Self {
        match self {
            Self::TruncatedVarint { offset } => Self::TruncatedVarint {
                offset: offset + base,
            },
            Self::VarintOverflow { offset } => Self::VarintOverflow {
                offset: offset + base,
            },
            Self::InvalidFieldLength {
                offset,
                length,
                remaining,
            } => Self::InvalidFieldLength {
                offset: offset + base,
                length,
                remaining,
            },
            Self::IncompleteSequence { offset, expected } => Self::IncompleteSequence {
                offset: offset + base,
                expected,
            },
            Self::InvalidUtf8 { offset, value } => Self::InvalidUtf8 {
                offset: offset + base,
                value,
            },
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    InvalidUri,
    InvalidEncoding,
    CorruptPayload,
    InvalidText,
    UnsupportedFormat,
    InvalidInput,
}

/// Crate-level error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for TotpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for TotpError {}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl From<MigrationError> for TotpError {
    fn from(e: MigrationError) -> Self {
        let kind = if e.is_structural() {
            TotpErrorKind::CorruptPayload
        } else {
            TotpErrorKind::InvalidText
        };
        TotpError::new(kind, "Unsupported or corrupted QR code").with_detail(e.to_string())
    }
}

impl From<TotpError> for String {
    fn from(e: TotpError) -> String {
        e.to_string()
    }
}
