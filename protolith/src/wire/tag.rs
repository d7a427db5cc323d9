//! Field tags: the `(field_number << 3) | wire_type` varint that precedes
//! every field in a binary-encoded message.

use core::fmt;

use crate::cursor::{Reader, Writer};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};

/// The six wire types a tag's low 3 bits select between.
///
/// `StartGroup`/`EndGroup` are never emitted by a generated encoder (groups
/// are a proto2-only feature), but a decoder must still recognize them in
/// order to skip an unknown group field without erroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    SixtyFourBit,
    LengthDelimited,
    StartGroup,
    EndGroup,
    ThirtyTwoBit,
}

impl WireType {
    pub const fn value(self) -> u64 {
        match self {
            WireType::Varint => 0,
            WireType::SixtyFourBit => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::ThirtyTwoBit => 5,
        }
    }

    pub const fn from_value(value: u64) -> Option<WireType> {
        match value {
            0 => Some(WireType::Varint),
            1 => Some(WireType::SixtyFourBit),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::ThirtyTwoBit),
            _ => None,
        }
    }

    /// Returns an error unless `self == expected`, for codecs that only
    /// tolerate one wire type for a given field (all scalar and
    /// length-delimited fields; packed and unpacked repeated fields accept
    /// either `LengthDelimited` or the element's own wire type, so they
    /// check that themselves instead of calling this).
    pub fn check(self, expected: WireType) -> Result<(), DecodeError> {
        if self == expected {
            Ok(())
        } else {
            Err(DecodeError::new(DecodeErrorKind::UnexpectedWireType {
                actual: self,
                expected,
            }))
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::SixtyFourBit => "64-bit",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start group",
            WireType::EndGroup => "end group",
            WireType::ThirtyTwoBit => "32-bit",
        };
        f.write_str(name)
    }
}

/// A decoded field tag: the field number and wire type packed into the key
/// varint that precedes a field's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub field_number: u32,
    pub wire_type: WireType,
}

pub const MIN_TAG: u32 = 1;
pub const MAX_TAG: u32 = (1 << 29) - 1;

/// Writes a field's key: `(field_number << 3) | wire_type` as a varint.
pub fn encode_key(writer: &mut impl Writer, field_number: u32, wire_type: WireType) -> Result<(), EncodeError> {
    debug_assert!((MIN_TAG..=MAX_TAG).contains(&field_number));
    let key = (u64::from(field_number) << 3) | wire_type.value();
    writer.write_varint(key)
}

/// Reads and decodes a field's key.
pub fn decode_key(reader: &mut impl Reader) -> Result<Tag, DecodeError> {
    let key = reader.read_varint()?;
    let wire_type =
        WireType::from_value(key & 0x07).ok_or(DecodeError::new(DecodeErrorKind::InvalidWireType(key & 0x07)))?;
    let field_number = key >> 3;
    if field_number == 0 || field_number > u64::from(MAX_TAG) {
        return Err(DecodeError::new(DecodeErrorKind::InvalidTag));
    }
    Ok(Tag {
        field_number: field_number as u32,
        wire_type,
    })
}

/// The number of bytes [`encode_key`] would write for `field_number`,
/// independent of `wire_type` (the wire type only ever occupies the low 3
/// bits of the first byte).
pub fn key_len(field_number: u32) -> usize {
    let key = u64::from(field_number) << 3;
    varint_len(key)
}

/// The number of bytes [`crate::cursor::Writer::write_varint`] would write
/// for `value`. Generated `encoded_len` implementations use this to size
/// varint-encoded fields without buffering, per the size-then-write design.
pub fn varint_len(value: u64) -> usize {
    ((64 - value.leading_zeros()).max(1) as usize + 6) / 7
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::cursor::BufferCursor;

    #[test]
    fn key_round_trips() {
        let mut cursor = BufferCursor::with_capacity(16);
        encode_key(&mut cursor, 100, WireType::LengthDelimited).unwrap();
        cursor.flip();
        let tag = decode_key(&mut cursor).unwrap();
        assert_eq!(tag.field_number, 100);
        assert_eq!(tag.wire_type, WireType::LengthDelimited);
    }

    #[test]
    fn rejects_tag_zero() {
        let mut cursor = BufferCursor::with_capacity(16);
        cursor.write_varint(0).unwrap();
        cursor.flip();
        assert!(matches!(
            decode_key(&mut cursor).unwrap_err().kind(),
            DecodeErrorKind::InvalidTag
        ));
    }

    #[test]
    fn rejects_invalid_wire_type() {
        let mut cursor = BufferCursor::with_capacity(16);
        cursor.write_varint((1u64 << 3) | 6).unwrap();
        cursor.flip();
        assert!(matches!(
            decode_key(&mut cursor).unwrap_err().kind(),
            DecodeErrorKind::InvalidWireType(6)
        ));
    }

    #[test]
    fn key_len_matches_field_100() {
        assert_eq!(key_len(100), key_len_reference(100));
    }

    fn key_len_reference(field_number: u32) -> usize {
        let mut cursor = BufferCursor::with_capacity(16);
        encode_key(&mut cursor, field_number, WireType::Varint).unwrap();
        cursor.position()
    }

    proptest! {
        #[test]
        fn key_round_trips_for_any_field_number_and_wire_type(
            field_number in MIN_TAG..=MAX_TAG,
            wire_type_value in 0u64..=5,
        ) {
            let wire_type = WireType::from_value(wire_type_value).unwrap();
            let mut cursor = BufferCursor::with_capacity(16);
            encode_key(&mut cursor, field_number, wire_type).unwrap();
            cursor.flip();
            let tag = decode_key(&mut cursor).unwrap();
            prop_assert_eq!(tag.field_number, field_number);
            prop_assert_eq!(tag.wire_type, wire_type);
        }

        #[test]
        fn key_len_matches_the_bytes_encode_key_actually_writes(field_number in MIN_TAG..=MAX_TAG) {
            prop_assert_eq!(key_len(field_number), key_len_reference(field_number));
        }
    }
}
