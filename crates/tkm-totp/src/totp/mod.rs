//! OTP import: sub-modules.

pub mod types;
pub mod varint;
pub mod wire;
pub mod utf8;
pub mod migration;
pub mod uri;
pub mod import;

// Re-export top-level items for convenience.
pub use types::*;
pub use migration::{decode_migration_payload, MigrationBatch, MigrationDecoder};
pub use import::{detect_format, parse_qr_data};
