//! Google Authenticator migration payload decoder.
//!
//! The payload carried by `otpauth-migration://offline?data=…` is a
//! protobuf-style message whose repeated field 1 holds one OTP record each.
//! A record has:
//!   1: secret (bytes)
//!   2: name (string)
//!   3: issuer (string)
//!   4: algorithm (varint: 0=unspecified,1=SHA1,2=SHA256,3=SHA512,4=MD5)
//!   5: digits (varint: 0=unspecified,1=SIX,2=EIGHT)
//!   6: type (varint: 0=unspecified,1=HOTP,2=TOTP)
//!   7: counter (varint)
//!
//! Structural corruption (bad varints, overlong fields) aborts the decode.
//! A record with no secret or name is dropped. A record with undecodable
//! text is dropped or aborts the decode, per [`RecordErrorPolicy`].

use std::fmt;

use crate::totp::types::*;
use crate::totp::utf8::{self, ContinuationCheck};
use crate::totp::wire::{self, FieldValue};

/// Top-level field holding one OTP record.
pub const ENTRY_FIELD: u8 = 1;

const SECRET_FIELD: u8 = 1;
const NAME_FIELD: u8 = 2;
const ISSUER_FIELD: u8 = 3;
const ALGORITHM_FIELD: u8 = 4;
const DIGITS_FIELD: u8 = 5;
const TYPE_FIELD: u8 = 6;
const COUNTER_FIELD: u8 = 7;

/// Encode raw secret bytes as RFC 4648 base-32 (uppercase, no padding).
pub fn encode_secret(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

/// Why a record was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingSecret,
    MissingLabel,
    UndecodableText(MigrationError),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSecret => write!(f, "no secret"),
            Self::MissingLabel => write!(f, "no account name"),
            Self::UndecodableText(e) => write!(f, "undecodable text: {}", e),
        }
    }
}

/// A record that did not produce a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedRecord {
    /// Zero-based position among the payload's records.
    pub index: usize,
    pub reason: DropReason,
}

/// Everything recovered from one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationBatch {
    /// Credentials in payload order; duplicates are kept.
    pub credentials: Vec<OtpCredential>,
    pub dropped: Vec<DroppedRecord>,
}

impl MigrationBatch {
    /// Number of records seen, kept or dropped.
    pub fn total_found(&self) -> usize {
        self.credentials.len() + self.dropped.len()
    }
}

enum RecordOutcome {
    Credential(OtpCredential),
    Dropped(DropReason),
}

/// Stateless decoder; one instance can serve any number of threads.
#[derive(Debug, Clone, Default)]
pub struct MigrationDecoder {
    options: DecoderOptions,
}

impl MigrationDecoder {
    pub fn new(options: DecoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Decode a raw (already base64-decoded) migration payload.
    pub fn decode(&self, payload: &[u8]) -> Result<MigrationBatch, MigrationError> {
        let check = ContinuationCheck::from_lenient(self.options.lenient_continuation);
        let mut batch = MigrationBatch::default();
        let mut index = 0usize;

        for field in wire::fields(payload) {
            let field = field?;
            let record = match (field.tag.field_number, field.value) {
                (ENTRY_FIELD, FieldValue::Bytes(record)) => record,
                _ => continue,
            };

            let base = field.value_offset;
            match extract_record(record, check).map_err(|e| e.offset_by(base))? {
                RecordOutcome::Credential(credential) => batch.credentials.push(credential),
                RecordOutcome::Dropped(reason) => {
                    let reason = match reason {
                        DropReason::UndecodableText(e) => DropReason::UndecodableText(e.offset_by(base)),
                        other => other,
                    };
                    if let DropReason::UndecodableText(ref err) = reason {
                        if self.options.record_errors == RecordErrorPolicy::Propagate {
                            return Err(err.clone());
                        }
                    }
                    log::warn!("Migration entry {} skipped: {}", index, reason);
                    batch.dropped.push(DroppedRecord { index, reason });
                }
            }
            index += 1;
        }

        log::debug!(
            "Decoded migration payload: {} bytes, {} credentials, {} dropped",
            payload.len(),
            batch.credentials.len(),
            batch.dropped.len()
        );
        Ok(batch)
    }
}

/// Decode a migration payload with default options, returning only the
/// credentials.
pub fn decode_migration_payload(payload: &[u8]) -> Result<Vec<OtpCredential>, MigrationError> {
    MigrationDecoder::default()
        .decode(payload)
        .map(|batch| batch.credentials)
}

/// Interpret one record. Structural errors are returned as `Err`; text
/// errors drop the record but the walk still runs to the end so that
/// structural corruption later in the record is not missed.
fn extract_record(record: &[u8], check: ContinuationCheck) -> Result<RecordOutcome, MigrationError> {
    let mut secret: Option<String> = None;
    let mut label: Option<String> = None;
    let mut issuer: Option<String> = None;
    let mut text_error: Option<MigrationError> = None;
    let mut credential = OtpCredential::new("", "");

    for field in wire::fields(record) {
        let field = field?;
        match (field.tag.field_number, field.value) {
            (SECRET_FIELD, FieldValue::Bytes(bytes)) => secret = Some(encode_secret(bytes)),
            (NAME_FIELD, FieldValue::Bytes(bytes)) => match utf8::decode_utf8(bytes, check) {
                Ok(text) => label = Some(text),
                Err(e) => {
                    text_error.get_or_insert(e.offset_by(field.value_offset));
                }
            },
            (ISSUER_FIELD, FieldValue::Bytes(bytes)) => match utf8::decode_utf8(bytes, check) {
                Ok(text) => issuer = Some(text),
                Err(e) => {
                    text_error.get_or_insert(e.offset_by(field.value_offset));
                }
            },
            (ALGORITHM_FIELD, FieldValue::Varint(v)) => {
                credential.algorithm = Algorithm::from_migration(v)
            }
            (DIGITS_FIELD, FieldValue::Varint(v)) => credential.digits = digits_from_migration(v),
            (TYPE_FIELD, FieldValue::Varint(v)) => credential.otp_type = OtpType::from_migration(v),
            (COUNTER_FIELD, FieldValue::Varint(v)) => credential.counter = v,
            _ => {}
        }
    }

    if let Some(err) = text_error {
        return Ok(RecordOutcome::Dropped(DropReason::UndecodableText(err)));
    }

    let secret = match secret {
        Some(secret) if !secret.is_empty() => secret,
        _ => return Ok(RecordOutcome::Dropped(DropReason::MissingSecret)),
    };
    let label = match label {
        Some(label) if !label.is_empty() => label,
        _ => return Ok(RecordOutcome::Dropped(DropReason::MissingLabel)),
    };

    credential.label = label;
    credential.secret = secret;
    if let Some(iss) = issuer {
        credential = credential.with_issuer(iss);
    }
    Ok(RecordOutcome::Credential(credential))
}
