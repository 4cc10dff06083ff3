//! # TOTP Token Manager – OTP import core
//!
//! Turns scanned QR text into OTP credentials:
//!
//! - **Migration payloads** – `otpauth-migration://offline?data=…` bulk
//!   exports, decoded from their protobuf-style wire format
//! - **Key URIs** – single `otpauth://totp/…` entries
//! - **Hardened decoding** – explicit varint, wire-format and UTF-8 readers
//!   with typed errors; one bad record never sinks the rest of a batch

pub mod totp;
