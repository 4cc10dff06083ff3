//! QR text parsing: `otpauth://` key URIs and the
//! `otpauth-migration://offline?data=…` wrapper around migration payloads.
//!
//! Key URI format: `otpauth://totp/LABEL?secret=BASE32&issuer=ISSUER`

use base64::Engine;

use crate::totp::types::*;
use crate::totp::utf8::{self, ContinuationCheck};

pub const OTPAUTH_PREFIX: &str = "otpauth://";
pub const MIGRATION_PREFIX: &str = "otpauth-migration://";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  otpauth://
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse a single `otpauth://totp/…` URI.
///
/// The whole decoded path is the label (an `Issuer:` prefix is kept as
/// part of it); the `issuer` query parameter becomes the issuer. Spaces in
/// the secret are removed.
pub fn parse_otpauth_uri(uri: &str) -> Result<OtpCredential, TotpError> {
    let url = url::Url::parse(uri.trim()).map_err(|e| {
        TotpError::new(TotpErrorKind::InvalidUri, format!("Invalid URI: {}", e))
    })?;

    if url.scheme() != "otpauth" {
        return Err(TotpError::new(
            TotpErrorKind::InvalidUri,
            format!("Expected scheme 'otpauth', got '{}'", url.scheme()),
        ));
    }

    if url.host_str() != Some("totp") {
        return Err(TotpError::new(
            TotpErrorKind::InvalidUri,
            format!("Only time-based URIs are supported, got {:?}", url.host_str()),
        ));
    }

    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let label = utf8::decode_utf8(&percent_decode(path), ContinuationCheck::Strict)
        .map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidUri, "Label is not valid UTF-8")
                .with_detail(e.to_string())
        })?;
    if label.is_empty() {
        return Err(TotpError::new(TotpErrorKind::InvalidUri, "Missing account label"));
    }

    let mut secret = None;
    let mut issuer = None;
    let mut algorithm = Algorithm::Sha1;
    let mut digits = 6u8;

    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.replace(' ', "")),
            "issuer" => issuer = Some(value.to_string()),
            "algorithm" => {
                if let Some(algo) = Algorithm::from_str_loose(&value) {
                    algorithm = algo;
                }
            }
            "digits" => {
                if let Ok(d) = value.parse::<u8>() {
                    if d == 6 || d == 7 || d == 8 {
                        digits = d;
                    }
                }
            }
            _ => {} // ignore unknown params
        }
    }

    let secret = secret.filter(|s| !s.is_empty()).ok_or_else(|| {
        TotpError::new(TotpErrorKind::InvalidUri, "Missing 'secret' parameter")
    })?;

    let mut credential = OtpCredential::new(label, secret);
    credential.algorithm = algorithm;
    credential.digits = digits;
    if let Some(iss) = issuer {
        credential = credential.with_issuer(iss);
    }
    Ok(credential)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  otpauth-migration://
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Extract and base64-decode the `data` parameter of a migration URI.
pub fn parse_migration_uri(uri: &str) -> Result<Vec<u8>, TotpError> {
    let trimmed = uri.trim();
    if !trimmed.starts_with(MIGRATION_PREFIX) {
        return Err(TotpError::new(
            TotpErrorKind::InvalidUri,
            "Expected an otpauth-migration:// URI",
        ));
    }

    let url = url::Url::parse(trimmed).map_err(|e| {
        TotpError::new(TotpErrorKind::InvalidUri, format!("Invalid URI: {}", e))
    })?;

    let data = url
        .query_pairs()
        .find(|(key, _)| key == "data")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| TotpError::new(TotpErrorKind::InvalidUri, "No 'data=' parameter found"))?;

    // Form decoding turns a literal '+' into a space; base64 never contains
    // spaces, so put them back.
    base64_decode(&data.replace(' ', "+"))
}

/// Decode base64 text, trying the standard alphabet first, then URL-safe
/// with and without padding.
pub fn base64_decode(data: &str) -> Result<Vec<u8>, TotpError> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};

    let data = data.trim();
    STANDARD
        .decode(data)
        .or_else(|_| STANDARD_NO_PAD.decode(data))
        .or_else(|_| URL_SAFE.decode(data))
        .or_else(|_| URL_SAFE_NO_PAD.decode(data))
        .map_err(|e| {
            TotpError::new(TotpErrorKind::InvalidEncoding, "Failed to decode base64 data")
                .with_detail(e.to_string())
        })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  URL decoding helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Percent-decode to raw bytes. Malformed escapes are kept literally.
fn percent_decode(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── otpauth:// ───────────────────────────────────────────────

    #[test]
    fn parse_basic_totp() {
        let uri = "otpauth://totp/alice@example.com?secret=JBSWY3DPEHPK3PXP&issuer=Example";
        let c = parse_otpauth_uri(uri).unwrap();
        assert_eq!(c.label, "alice@example.com");
        assert_eq!(c.issuer.as_deref(), Some("Example"));
        assert_eq!(c.secret, "JBSWY3DPEHPK3PXP");
        assert_eq!(c.display_label(), "alice@example.com (Example)");
    }

    #[test]
    fn parse_keeps_issuer_prefix_in_label() {
        let uri = "otpauth://totp/Acme:bob?secret=JBSWY3DPEHPK3PXP";
        let c = parse_otpauth_uri(uri).unwrap();
        assert_eq!(c.label, "Acme:bob");
        assert!(c.issuer.is_none());
        assert_eq!(c.display_label(), "Acme:bob");
    }

    #[test]
    fn parse_encoded_label() {
        let uri = "otpauth://totp/My%20Corp%3A%E7%94%A8%E6%88%B7?secret=ABC&issuer=My%20Corp";
        let c = parse_otpauth_uri(uri).unwrap();
        assert_eq!(c.label, "My Corp:用户");
        assert_eq!(c.issuer.as_deref(), Some("My Corp"));
    }

    #[test]
    fn parse_strips_spaces_from_secret() {
        let uri = "otpauth://totp/x?secret=JBSW%20Y3DP%20EHPK%203PXP";
        let c = parse_otpauth_uri(uri).unwrap();
        assert_eq!(c.secret, "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn parse_optional_params() {
        let uri = "otpauth://totp/x?secret=ABC&algorithm=SHA512&digits=8";
        let c = parse_otpauth_uri(uri).unwrap();
        assert_eq!(c.algorithm, Algorithm::Sha512);
        assert_eq!(c.digits, 8);
    }

    #[test]
    fn parse_errors() {
        assert!(parse_otpauth_uri("https://example.com").is_err());
        assert!(parse_otpauth_uri("otpauth://totp/Test?issuer=X").is_err());
        assert!(parse_otpauth_uri("otpauth://totp/Test?secret=").is_err());
        assert!(parse_otpauth_uri("otpauth://totp/?secret=ABC").is_err());
        assert!(parse_otpauth_uri("otpauth://hotp/Test?secret=ABC&counter=1").is_err());
        assert!(parse_otpauth_uri("not a url at all").is_err());
    }

    #[test]
    fn parse_rejects_invalid_utf8_label() {
        let err = parse_otpauth_uri("otpauth://totp/%FF?secret=ABC").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidUri);
    }

    // ── otpauth-migration:// ─────────────────────────────────────

    #[test]
    fn migration_uri_standard_base64() {
        // 0x0A 0x00 → "CgA="
        let bytes = parse_migration_uri("otpauth-migration://offline?data=CgA%3D").unwrap();
        assert_eq!(bytes, vec![0x0A, 0x00]);
    }

    #[test]
    fn migration_uri_literal_plus_survives() {
        // 0xFB 0xEF → "++8=" in the standard alphabet
        let bytes = parse_migration_uri("otpauth-migration://offline?data=++8=").unwrap();
        assert_eq!(bytes, vec![0xFB, 0xEF]);
    }

    #[test]
    fn migration_uri_url_safe_unpadded() {
        let bytes = parse_migration_uri("otpauth-migration://offline?data=--8").unwrap();
        assert_eq!(bytes, vec![0xFB, 0xEF]);
    }

    #[test]
    fn migration_uri_without_data() {
        let err = parse_migration_uri("otpauth-migration://offline").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidUri);
    }

    #[test]
    fn migration_uri_bad_base64() {
        let err = parse_migration_uri("otpauth-migration://offline?data=%%%%").unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidEncoding);
    }

    #[test]
    fn migration_uri_wrong_scheme() {
        assert!(parse_migration_uri("otpauth://totp/x?secret=A").is_err());
    }

    // ── Helpers ──────────────────────────────────────────────────

    #[test]
    fn percent_decode_basic() {
        assert_eq!(percent_decode("hello%20world"), b"hello world");
        assert_eq!(percent_decode("a%40b"), b"a@b");
        assert_eq!(percent_decode("bad%zzescape"), b"bad%zzescape");
        assert_eq!(percent_decode("tail%4"), b"tail%4");
    }
}
