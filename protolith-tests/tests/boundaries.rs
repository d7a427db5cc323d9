//! Wire-level edge cases: numeric extremes, varint byte-length boundaries, and
//! the empty/zero-length forms every proto3 default suppresses.

use protolith::cursor::{BufferCursor, Writer};
use protolith::message::BinaryCodec;
use protolith_tests::scenarios::{
    Boundaries, BoundariesBinaryCodec, Defaults, DefaultsBinaryCodec, PackedRepeated,
    PackedRepeatedBinaryCodec,
};

#[test]
fn signed_32_bit_extremes_round_trip() {
    for value in [i32::MIN, -1, 0, 1, i32::MAX] {
        let b = Boundaries {
            signed32: value,
            ..Boundaries::DEFAULT
        };
        let bytes = BoundariesBinaryCodec.encode_to_vec(&b);
        let decoded = BoundariesBinaryCodec.decode(&mut BufferCursor::from_vec(bytes)).unwrap();
        assert_eq!(decoded.signed32, value);
    }
}

#[test]
fn signed_64_bit_extremes_round_trip() {
    for value in [i64::MIN, -1, 0, 1, i64::MAX] {
        let b = Boundaries {
            signed64: value,
            ..Boundaries::DEFAULT
        };
        let bytes = BoundariesBinaryCodec.encode_to_vec(&b);
        let decoded = BoundariesBinaryCodec.decode(&mut BufferCursor::from_vec(bytes)).unwrap();
        assert_eq!(decoded.signed64, value);
    }
}

#[test]
fn unsigned_32_and_64_bit_extremes_round_trip() {
    for value in [0u32, 1, u32::MAX] {
        let b = Boundaries {
            unsigned32: value,
            ..Boundaries::DEFAULT
        };
        let bytes = BoundariesBinaryCodec.encode_to_vec(&b);
        let decoded = BoundariesBinaryCodec.decode(&mut BufferCursor::from_vec(bytes)).unwrap();
        assert_eq!(decoded.unsigned32, value);
    }

    for value in [0u64, 1, u64::MAX] {
        let b = Boundaries {
            unsigned64: value,
            ..Boundaries::DEFAULT
        };
        let bytes = BoundariesBinaryCodec.encode_to_vec(&b);
        let decoded = BoundariesBinaryCodec.decode(&mut BufferCursor::from_vec(bytes)).unwrap();
        assert_eq!(decoded.unsigned64, value);
    }
}

#[test]
fn varint_byte_length_boundaries_round_trip() {
    let boundary_values: [u64; 5] = [
        0x7F,        // largest 1-byte varint
        0x3FFF,      // largest 2-byte varint
        0x0FFF_FFFF, // largest 4-byte varint
        0xFFFF_FFFF, // smallest value needing a 5th byte
        u64::MAX,    // largest value, needs all 10 bytes
    ];

    for value in boundary_values {
        let b = Boundaries {
            unsigned64: value,
            ..Boundaries::DEFAULT
        };
        let bytes = BoundariesBinaryCodec.encode_to_vec(&b);
        let decoded = BoundariesBinaryCodec.decode(&mut BufferCursor::from_vec(bytes)).unwrap();
        assert_eq!(decoded.unsigned64, value);
    }
}

#[test]
fn empty_repeated_field_is_absent_from_the_wire() {
    let empty = PackedRepeated { values: Vec::new() };
    assert!(PackedRepeatedBinaryCodec.encode_to_vec(&empty).is_empty());
}

#[test]
fn empty_string_field_is_absent_from_the_wire() {
    let defaults = Defaults {
        a: 0,
        b: String::new(),
    };
    assert!(DefaultsBinaryCodec.encode_to_vec(&defaults).is_empty());
}

#[test]
fn single_element_packed_repeated_field_still_uses_packed_framing() {
    let value = PackedRepeated { values: vec![5] };
    let bytes = PackedRepeatedBinaryCodec.encode_to_vec(&value);
    // key (LengthDelimited, field 100) + length prefix (1) + one packed element byte.
    assert_eq!(bytes, vec![0xA2, 0x06, 0x01, 0x05]);
}

#[test]
fn zero_length_length_delimited_field_decodes_to_the_empty_value() {
    use protolith::wire::{encode_key, WireType};

    let mut cursor = BufferCursor::with_capacity(8);
    encode_key(&mut cursor, 2, WireType::LengthDelimited).unwrap();
    cursor.write_varint(0).unwrap();
    cursor.flip();

    let decoded = DefaultsBinaryCodec.decode(&mut cursor).unwrap();
    assert_eq!(decoded.b, "");
}

#[test]
fn empty_bytes_field_round_trips_through_zero_length_framing() {
    let b = Boundaries {
        payload: protolith::ByteSlice::EMPTY,
        ..Boundaries::DEFAULT
    };
    assert!(BoundariesBinaryCodec.encode_to_vec(&b).is_empty());

    let mut cursor = BufferCursor::with_capacity(8);
    protolith::wire::encode_key(&mut cursor, 5, protolith::wire::WireType::LengthDelimited).unwrap();
    cursor.write_varint(0).unwrap();
    cursor.flip();
    let decoded = BoundariesBinaryCodec.decode(&mut cursor).unwrap();
    assert_eq!(decoded.payload, protolith::ByteSlice::EMPTY);
}
