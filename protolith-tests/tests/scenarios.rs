//! End-to-end checks against literal wire and JSON bytes, not just round-trips.

use protolith::cursor::{BufferCursor, Writer};
use protolith::message::{BinaryCodec, JsonCodec};
use protolith_tests::scenarios::{
    Defaults, DefaultsBinaryCodec, Event, EventBinaryCodec, EventJsonCodec, KnownField,
    KnownFieldBinaryCodec, PackedRepeated, PackedRepeatedBinaryCodec,
};
use protolith_tests::scenarios::shape::Kind;
use protolith_tests::scenarios::Shape;

#[test]
fn timestamp_like_message_matches_reference_bytes() {
    let event = Event {
        seconds: 1234,
        nanos: 567,
    };
    let bytes = EventBinaryCodec.encode_to_vec(&event);
    assert_eq!(bytes, vec![0x08, 0xD2, 0x09, 0x10, 0xB7, 0x04]);
    assert_eq!(EventBinaryCodec.encoded_len(&event), 6);

    let decoded = EventBinaryCodec
        .decode(&mut BufferCursor::from_vec(bytes))
        .unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn all_default_fields_encode_to_zero_bytes() {
    let defaults = Defaults {
        a: 0,
        b: String::new(),
    };
    assert!(DefaultsBinaryCodec.encode_to_vec(&defaults).is_empty());
    assert_eq!(DefaultsBinaryCodec.encoded_len(&defaults), 0);

    let decoded = DefaultsBinaryCodec
        .decode(&mut BufferCursor::from_vec(Vec::new()))
        .unwrap();
    assert_eq!(decoded, defaults);
}

#[test]
fn packed_and_unpacked_repeated_encodings_both_decode_to_the_same_value() {
    let packed = vec![0xA2, 0x06, 0x03, 0x01, 0x02, 0x03];
    let unpacked = vec![0xA0, 0x06, 0x01, 0xA0, 0x06, 0x02, 0xA0, 0x06, 0x03];

    let value = PackedRepeated {
        values: vec![1, 2, 3],
    };
    assert_eq!(PackedRepeatedBinaryCodec.encode_to_vec(&value), packed);

    let from_packed = PackedRepeatedBinaryCodec
        .decode(&mut BufferCursor::from_vec(packed))
        .unwrap();
    let from_unpacked = PackedRepeatedBinaryCodec
        .decode(&mut BufferCursor::from_vec(unpacked))
        .unwrap();
    assert_eq!(from_packed, value);
    assert_eq!(from_unpacked, value);
}

#[test]
fn oneof_keeps_exactly_one_variant_active() {
    let mut value = Shape { kind: Kind::A(7) };
    assert_eq!(value.kind, Kind::A(7));

    value.kind = Kind::B("hello".to_string());
    assert_eq!(value.kind, Kind::B("hello".to_string()));

    let bytes = protolith_tests::scenarios::ShapeBinaryCodec.encode_to_vec(&value);
    let decoded = protolith_tests::scenarios::ShapeBinaryCodec
        .decode(&mut BufferCursor::from_vec(bytes))
        .unwrap();
    assert_eq!(decoded.kind, Kind::B("hello".to_string()));
}

#[test]
fn oneof_last_occurrence_on_the_wire_wins() {
    use protolith::wire::{encode_key, WireType};

    let mut cursor = BufferCursor::with_capacity(32);
    encode_key(&mut cursor, 1, WireType::Varint).unwrap();
    cursor.write_varint(7).unwrap();
    encode_key(&mut cursor, 2, WireType::LengthDelimited).unwrap();
    protolith::wire::LengthDelimitedWriter::write(&mut cursor, b"later").unwrap();
    cursor.flip();

    let decoded = protolith_tests::scenarios::ShapeBinaryCodec
        .decode(&mut cursor)
        .unwrap();
    assert_eq!(decoded.kind, Kind::B("later".to_string()));
}

#[test]
fn json_encoding_quotes_int64_and_matches_canonical_field_order() {
    let event = Event {
        seconds: 1234,
        nanos: 567,
    };
    let json = EventJsonCodec.encode_json_to_string(&event);
    assert_eq!(json, "{\"seconds\":\"1234\",\"nanos\":567}");
}

#[test]
fn json_decoding_accepts_unquoted_int64_values() {
    let decoded = EventJsonCodec
        .decode_json_str("{\"seconds\":1234,\"nanos\":567}")
        .unwrap();
    assert_eq!(
        decoded,
        Event {
            seconds: 1234,
            nanos: 567,
        }
    );

    let decoded_quoted = EventJsonCodec
        .decode_json_str("{\"seconds\":\"1234\",\"nanos\":567}")
        .unwrap();
    assert_eq!(decoded, decoded_quoted);
}

#[test]
fn unknown_field_number_is_skipped_without_error() {
    use protolith::wire::{encode_key, WireType};

    let mut cursor = BufferCursor::with_capacity(32);
    encode_key(&mut cursor, 999, WireType::Varint).unwrap();
    cursor.write_varint(42).unwrap();
    encode_key(&mut cursor, 1, WireType::Varint).unwrap();
    cursor.write_varint(5).unwrap();
    cursor.flip();

    let decoded = KnownFieldBinaryCodec.decode(&mut cursor).unwrap();
    assert_eq!(decoded, KnownField { field1: 5 });
}
