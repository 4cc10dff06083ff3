//! Minimal walker for the protobuf-style wire format used by migration
//! payloads.
//!
//! This is not a general protobuf decoder. Tags are a single byte, only
//! varint and length-delimited values are understood, and every other wire
//! type is stepped over with a fixed one-byte skip (see
//! [`UNKNOWN_WIRE_TYPE_SKIP`]). The migration schema never emits the
//! fixed-width wire types, so the shortcut holds for this format only.

use crate::totp::types::MigrationError;
use crate::totp::varint;

/// Bytes stepped over after the tag of a field whose wire type is neither
/// varint nor length-delimited. Schema-specific: fixed32/fixed64 fields
/// would need 4/8 bytes.
pub const UNKNOWN_WIRE_TYPE_SKIP: usize = 1;

/// The 3-bit wire type carried in a tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    LengthDelimited,
    Other(u8),
}

impl WireType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Varint,
            2 => Self::LengthDelimited,
            other => Self::Other(other),
        }
    }
}

/// Field header decoded from one tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTag {
    pub field_number: u8,
    pub wire_type: WireType,
}

impl FieldTag {
    pub fn from_byte(byte: u8) -> Self {
        Self {
            field_number: byte >> 3,
            wire_type: WireType::from_bits(byte),
        }
    }
}

/// Decoded field payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Varint(u64),
    Bytes(&'a [u8]),
    /// Unknown wire type; nothing was interpreted.
    Skipped,
}

/// One field produced by [`FieldReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field<'a> {
    pub tag: FieldTag,
    /// Position of the tag byte.
    pub offset: usize,
    /// Position of the first value byte (for `Bytes`, the first payload byte).
    pub value_offset: usize,
    pub value: FieldValue<'a>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Cursor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Read position over a borrowed buffer. Owned by exactly one walk.
#[derive(Debug)]
pub struct ParseCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ParseCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn read_byte(&mut self) -> Option<u8> {
        let byte = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    pub fn read_varint(&mut self) -> Result<u64, MigrationError> {
        let (value, consumed) = varint::read_varint(self.data, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    /// Take exactly `len` bytes, failing if fewer remain.
    pub fn read_slice(&mut self, len: u64) -> Result<&'a [u8], MigrationError> {
        let remaining = self.remaining();
        let len = usize::try_from(len)
            .ok()
            .filter(|&l| l <= remaining)
            .ok_or(MigrationError::InvalidFieldLength {
                offset: self.pos,
                length: len,
                remaining,
            })?;
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Advance up to `n` bytes, stopping at the end of the buffer.
    pub fn skip(&mut self, n: usize) {
        self.pos = self.pos.saturating_add(n).min(self.data.len());
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Field iterator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Single-pass iterator over the fields of a buffer.
///
/// Yields `Err` at most once; the iterator is exhausted afterwards. A lone
/// trailing tag byte with nothing after it ends the walk without a field.
#[derive(Debug)]
pub struct FieldReader<'a> {
    cursor: ParseCursor<'a>,
    done: bool,
}

/// Walk the fields of `data`.
pub fn fields(data: &[u8]) -> FieldReader<'_> {
    FieldReader {
        cursor: ParseCursor::new(data),
        done: false,
    }
}

impl<'a> FieldReader<'a> {
    fn read_field(&mut self) -> Result<Option<Field<'a>>, MigrationError> {
        if self.cursor.remaining() < 2 {
            return Ok(None);
        }
        let offset = self.cursor.position();
        let tag = match self.cursor.read_byte() {
            Some(byte) => FieldTag::from_byte(byte),
            None => return Ok(None),
        };

        let (value_offset, value) = match tag.wire_type {
            WireType::Varint => {
                let at = self.cursor.position();
                (at, FieldValue::Varint(self.cursor.read_varint()?))
            }
            WireType::LengthDelimited => {
                let len = self.cursor.read_varint()?;
                let at = self.cursor.position();
                (at, FieldValue::Bytes(self.cursor.read_slice(len)?))
            }
            WireType::Other(_) => {
                let at = self.cursor.position();
                self.cursor.skip(UNKNOWN_WIRE_TYPE_SKIP);
                (at, FieldValue::Skipped)
            }
        };

        Ok(Some(Field {
            tag,
            offset,
            value_offset,
            value,
        }))
    }
}

impl<'a> Iterator for FieldReader<'a> {
    type Item = Result<Field<'a>, MigrationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_field() {
            Ok(Some(field)) => Some(Ok(field)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(data: &[u8]) -> Vec<Result<Field<'_>, MigrationError>> {
        fields(data).collect()
    }

    #[test]
    fn tag_byte_split() {
        let tag = FieldTag::from_byte(0x0A);
        assert_eq!(tag.field_number, 1);
        assert_eq!(tag.wire_type, WireType::LengthDelimited);

        let tag = FieldTag::from_byte(0x28);
        assert_eq!(tag.field_number, 5);
        assert_eq!(tag.wire_type, WireType::Varint);

        let tag = FieldTag::from_byte(0x0D);
        assert_eq!(tag.wire_type, WireType::Other(5));
    }

    #[test]
    fn walks_varint_and_bytes() {
        let data = [0x08, 0x96, 0x01, 0x12, 0x03, b'a', b'b', b'c'];
        let got: Vec<_> = collect(&data).into_iter().map(Result::unwrap).collect();
        assert_eq!(got.len(), 2);

        assert_eq!(got[0].tag.field_number, 1);
        assert_eq!(got[0].offset, 0);
        assert_eq!(got[0].value, FieldValue::Varint(150));

        assert_eq!(got[1].tag.field_number, 2);
        assert_eq!(got[1].offset, 3);
        assert_eq!(got[1].value_offset, 5);
        assert_eq!(got[1].value, FieldValue::Bytes(b"abc"));
    }

    #[test]
    fn empty_length_delimited_field() {
        let data = [0x1A, 0x00];
        let got: Vec<_> = collect(&data).into_iter().map(Result::unwrap).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, FieldValue::Bytes(&[]));
    }

    #[test]
    fn overlong_length_is_rejected() {
        let data = [0x0A, 0x05, 0x01, 0x02];
        let got = collect(&data);
        assert_eq!(got.len(), 1);
        assert_eq!(
            got[0],
            Err(MigrationError::InvalidFieldLength {
                offset: 2,
                length: 5,
                remaining: 2
            })
        );
    }

    #[test]
    fn huge_length_is_rejected_without_overflow() {
        let mut data = vec![0x0A];
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]);
        data.push(0x00);
        let got = collect(&data);
        assert!(matches!(
            got[0],
            Err(MigrationError::InvalidFieldLength { length: u64::MAX, .. })
        ));
    }

    #[test]
    fn truncated_varint_value_is_rejected() {
        let data = [0x08, 0x80];
        assert_eq!(
            collect(&data),
            vec![Err(MigrationError::TruncatedVarint { offset: 1 })]
        );
    }

    #[test]
    fn error_ends_iteration() {
        let data = [0x0A, 0x09, 0x01, 0x08, 0x01];
        let mut reader = fields(&data);
        assert!(matches!(reader.next(), Some(Err(_))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn unknown_wire_type_skips_one_byte() {
        // field 1 fixed32 (wire type 5), then field 2 varint = 7
        let data = [0x0D, 0xAA, 0x10, 0x07];
        let got: Vec<_> = collect(&data).into_iter().map(Result::unwrap).collect();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].value, FieldValue::Skipped);
        assert_eq!(got[1].tag.field_number, 2);
        assert_eq!(got[1].value, FieldValue::Varint(7));
    }

    #[test]
    fn lone_trailing_tag_byte_is_ignored() {
        let data = [0x08, 0x01, 0x0A];
        let got: Vec<_> = collect(&data).into_iter().map(Result::unwrap).collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].value, FieldValue::Varint(1));
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        assert!(collect(&[]).is_empty());
    }

    #[test]
    fn cursor_skip_clamps_at_end() {
        let data = [1u8, 2, 3];
        let mut cursor = ParseCursor::new(&data);
        cursor.skip(10);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.read_byte().is_none());
    }
}
