//! Base-128 varint reader.
//!
//! Seven data bits per byte, least-significant group first; a set high bit
//! means another byte follows. Values are accumulated into a `u64`.

use crate::totp::types::MigrationError;

/// Longest encoding of a 64-bit value.
pub const MAX_VARINT_LEN: usize = 10;

/// Decode one varint starting at `start`.
///
/// Returns `(value, bytes_consumed)`; `bytes_consumed` is at least 1.
pub fn read_varint(data: &[u8], start: usize) -> Result<(u64, usize), MigrationError> {
    let bytes = data.get(start..).unwrap_or(&[]);
    let mut value: u64 = 0;

    for (i, &byte) in bytes.iter().enumerate() {
        if i == MAX_VARINT_LEN || (i == MAX_VARINT_LEN - 1 && byte > 1) {
            return Err(MigrationError::VarintOverflow { offset: start });
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(MigrationError::TruncatedVarint { offset: start })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte() {
        assert_eq!(read_varint(&[42], 0).unwrap(), (42, 1));
        assert_eq!(read_varint(&[0], 0).unwrap(), (0, 1));
    }

    #[test]
    fn multi_byte() {
        // 150 = 0x96 0x01
        assert_eq!(read_varint(&[0x96, 0x01], 0).unwrap(), (150, 2));
        // 300 = 0xAC 0x02
        assert_eq!(read_varint(&[0xAC, 0x02], 0).unwrap(), (300, 2));
    }

    #[test]
    fn reads_from_offset_and_ignores_trailing_bytes() {
        let data = [0xFF, 0x96, 0x01, 0x07];
        assert_eq!(read_varint(&data, 1).unwrap(), (150, 2));
    }

    #[test]
    fn values_above_32_bits_are_kept() {
        // 2^35 = 0x80 0x80 0x80 0x80 0x80 0x01
        let data = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert_eq!(read_varint(&data, 0).unwrap(), (1u64 << 35, 6));
    }

    #[test]
    fn u64_max() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert_eq!(read_varint(&data, 0).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn truncated_varint_is_an_error() {
        assert_eq!(
            read_varint(&[0x96], 0),
            Err(MigrationError::TruncatedVarint { offset: 0 })
        );
        assert_eq!(
            read_varint(&[0x01, 0x80, 0x80], 1),
            Err(MigrationError::TruncatedVarint { offset: 1 })
        );
    }

    #[test]
    fn start_past_end_is_truncated() {
        assert_eq!(
            read_varint(&[0x01], 1),
            Err(MigrationError::TruncatedVarint { offset: 1 })
        );
        assert_eq!(
            read_varint(&[], 5),
            Err(MigrationError::TruncatedVarint { offset: 5 })
        );
    }

    #[test]
    fn overlong_varint_overflows() {
        let eleven = [0x80u8; 11];
        assert_eq!(
            read_varint(&eleven, 0),
            Err(MigrationError::VarintOverflow { offset: 0 })
        );
        let tenth_too_big = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];
        assert_eq!(
            read_varint(&tenth_too_big, 0),
            Err(MigrationError::VarintOverflow { offset: 0 })
        );
    }
}
