//! Explicit UTF-8 decoder for label and issuer bytes.
//!
//! Written out by hand so every failure maps onto a [`MigrationError`]
//! with the offending offset instead of a generic conversion error.

use crate::totp::types::MigrationError;

/// How continuation bytes are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContinuationCheck {
    /// Continuation bytes must be in 0x80–0xBF.
    #[default]
    Strict,
    /// Any byte is accepted; only its low six bits are used.
    Lenient,
}

impl ContinuationCheck {
    pub fn from_lenient(lenient: bool) -> Self {
        if lenient {
            Self::Lenient
        } else {
            Self::Strict
        }
    }
}

const MAX_CODE_POINT: u32 = 0x10FFFF;

/// Decode `bytes` as UTF-8.
pub fn decode_utf8(bytes: &[u8], check: ContinuationCheck) -> Result<String, MigrationError> {
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let lead = bytes[i];
        let (width, init) = match lead {
            0x00..=0x7F => (1, u32::from(lead)),
            0xC0..=0xDF => (2, u32::from(lead & 0x1F)),
            0xE0..=0xEF => (3, u32::from(lead & 0x0F)),
            0xF0..=0xF7 => (4, u32::from(lead & 0x07)),
            _ => {
                return Err(MigrationError::InvalidUtf8 {
                    offset: i,
                    value: u32::from(lead),
                })
            }
        };

        if i + width > bytes.len() {
            return Err(MigrationError::IncompleteSequence {
                offset: i,
                expected: width,
            });
        }

        let mut code_point = init;
        for (k, &byte) in bytes[i + 1..i + width].iter().enumerate() {
            if check == ContinuationCheck::Strict && byte & 0xC0 != 0x80 {
                return Err(MigrationError::InvalidUtf8 {
                    offset: i + 1 + k,
                    value: u32::from(byte),
                });
            }
            code_point = (code_point << 6) | u32::from(byte & 0x3F);
        }

        // Surrogate halves are rejected too: a `char` cannot hold them.
        let ch = Some(code_point)
            .filter(|&cp| cp <= MAX_CODE_POINT)
            .and_then(char::from_u32)
            .ok_or(MigrationError::InvalidUtf8 {
                offset: i,
                value: code_point,
            })?;
        out.push(ch);
        i += width;
    }

    Ok(out)
}
