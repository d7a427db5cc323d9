//! Properties that must hold for every message, not just the literal scenarios.

use protolith::cursor::{BufferCursor, Writer};
use protolith::message::{BinaryCodec, JsonCodec};
use protolith_tests::scenarios::shape::Kind;
use protolith_tests::scenarios::{
    Boundaries, BoundariesBinaryCodec, Defaults, DefaultsBinaryCodec, DefaultsJsonCodec, Event,
    EventBinaryCodec, EventJsonCodec, PackedRepeated, PackedRepeatedBinaryCodec, Shape,
    ShapeBinaryCodec, Tree, TreeBinaryCodec,
};

fn binary_round_trips<C>(codec: &C, value: &C::Value)
where
    C: BinaryCodec,
    C::Value: Clone + PartialEq + core::fmt::Debug,
{
    let bytes = codec.encode_to_vec(value);
    assert_eq!(bytes.len(), codec.encoded_len(value), "encoded_len must match the actual write");
    let decoded = codec.decode(&mut BufferCursor::from_vec(bytes)).unwrap();
    assert_eq!(&decoded, value);
}

#[test]
fn binary_round_trip_holds_for_scalars_and_messages() {
    binary_round_trips(&EventBinaryCodec, &Event { seconds: -42, nanos: 9 });
    binary_round_trips(
        &DefaultsBinaryCodec,
        &Defaults {
            a: 5,
            b: "non-default".to_string(),
        },
    );
    binary_round_trips(
        &TreeBinaryCodec,
        &Tree {
            value: 1,
            left: Some(Box::new(Tree {
                value: 2,
                left: None,
                right: None,
            })),
            right: None,
        },
    );
}

#[test]
fn json_round_trip_holds_modulo_canonical_defaults() {
    let event = Event {
        seconds: 0,
        nanos: 9,
    };
    let json = EventJsonCodec.encode_json_to_string(&event);
    // seconds is at its default (0) so it is suppressed on the wire, the way every
    // proto3-default field is.
    assert_eq!(json, "{\"nanos\":9}");
    let decoded = EventJsonCodec.decode_json_str(&json).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn json_defaults_round_trip_to_an_empty_object() {
    let defaults = Defaults::DEFAULT;
    assert_eq!(DefaultsJsonCodec.encode_json_to_string(&defaults), "{}");
    let decoded = DefaultsJsonCodec.decode_json_str("{}").unwrap();
    assert_eq!(decoded, defaults);
}

#[test]
fn packed_repeated_field_decodes_identically_from_packed_or_unpacked_wire_forms() {
    let packed_wire = PackedRepeatedBinaryCodec.encode_to_vec(&PackedRepeated { values: vec![-1, 0, 1] });

    let mut unpacked_wire = BufferCursor::with_capacity(64);
    for v in [-1i32, 0, 1] {
        protolith::wire::encode_key(&mut unpacked_wire, 100, protolith::wire::WireType::Varint).unwrap();
        unpacked_wire.write_varint(v as i64 as u64).unwrap();
    }
    unpacked_wire.flip();

    let from_packed = PackedRepeatedBinaryCodec
        .decode(&mut BufferCursor::from_vec(packed_wire))
        .unwrap();
    let from_unpacked = PackedRepeatedBinaryCodec.decode(&mut unpacked_wire).unwrap();
    assert_eq!(from_packed, from_unpacked);
    assert_eq!(from_packed.values, vec![-1, 0, 1]);
}

#[test]
fn unknown_tags_are_skipped_regardless_of_wire_type() {
    use protolith::wire::{encode_key, WireType};

    let mut cursor = BufferCursor::with_capacity(64);
    encode_key(&mut cursor, 500, WireType::Varint).unwrap();
    cursor.write_varint(1).unwrap();
    encode_key(&mut cursor, 501, WireType::SixtyFourBit).unwrap();
    cursor.write_fixed64(0).unwrap();
    encode_key(&mut cursor, 502, WireType::ThirtyTwoBit).unwrap();
    cursor.write_fixed32(0).unwrap();
    encode_key(&mut cursor, 503, WireType::LengthDelimited).unwrap();
    protolith::wire::LengthDelimitedWriter::write(&mut cursor, b"ignored").unwrap();
    encode_key(&mut cursor, 1, WireType::Varint).unwrap();
    cursor.write_varint(77).unwrap();
    cursor.flip();

    let decoded = EventBinaryCodec.decode(&mut cursor).unwrap();
    assert_eq!(decoded.seconds, 77);
}

#[test]
fn duplicate_singular_scalar_occurrences_keep_the_last_one() {
    use protolith::wire::{encode_key, WireType};

    let mut cursor = BufferCursor::with_capacity(32);
    encode_key(&mut cursor, 1, WireType::Varint).unwrap();
    cursor.write_varint(111).unwrap();
    encode_key(&mut cursor, 1, WireType::Varint).unwrap();
    cursor.write_varint(222).unwrap();
    cursor.flip();

    let decoded = EventBinaryCodec.decode(&mut cursor).unwrap();
    assert_eq!(decoded.seconds, 222);
}

#[test]
fn duplicate_singular_message_occurrences_merge_their_fields() {
    let mut first = BufferCursor::with_capacity(128);
    protolith::wire::encode_key(&mut first, 2, protolith::wire::WireType::LengthDelimited).unwrap();
    TreeBinaryCodec
        .encode_length_delimited(
            &Tree {
                value: 1,
                left: None,
                right: None,
            },
            &mut first,
        )
        .unwrap();
    // Second occurrence carries only `right`; `value` is its default so it's suppressed, and
    // the merged left child must survive from the first occurrence.
    protolith::wire::encode_key(&mut first, 2, protolith::wire::WireType::LengthDelimited).unwrap();
    TreeBinaryCodec
        .encode_length_delimited(
            &Tree {
                value: 0,
                left: None,
                right: Some(Box::new(Tree {
                    value: 3,
                    left: None,
                    right: None,
                })),
            },
            &mut first,
        )
        .unwrap();
    first.flip();

    let decoded = TreeBinaryCodec.decode(&mut first).unwrap();
    let left = decoded.left.unwrap();
    assert_eq!(
        *left,
        Tree {
            value: 1,
            left: None,
            right: Some(Box::new(Tree {
                value: 3,
                left: None,
                right: None,
            })),
        }
    );
}

#[test]
fn repeated_fields_concatenate_across_duplicate_occurrences() {
    let mut cursor = BufferCursor::with_capacity(64);
    protolith::wire::encode_key(&mut cursor, 100, protolith::wire::WireType::Varint).unwrap();
    cursor.write_varint(1).unwrap();
    protolith::wire::encode_key(&mut cursor, 100, protolith::wire::WireType::Varint).unwrap();
    cursor.write_varint(2).unwrap();
    cursor.flip();

    let decoded = PackedRepeatedBinaryCodec.decode(&mut cursor).unwrap();
    assert_eq!(decoded.values, vec![1, 2]);
}

#[test]
fn oneof_decoding_ends_with_exactly_one_active_variant() {
    let mut cursor = BufferCursor::with_capacity(32);
    protolith::wire::encode_key(&mut cursor, 1, protolith::wire::WireType::Varint).unwrap();
    cursor.write_varint(3).unwrap();
    protolith::wire::encode_key(&mut cursor, 2, protolith::wire::WireType::LengthDelimited).unwrap();
    protolith::wire::LengthDelimitedWriter::write(&mut cursor, b"str").unwrap();
    cursor.flip();

    let decoded = ShapeBinaryCodec.decode(&mut cursor).unwrap();
    assert_eq!(decoded.kind, Kind::B("str".to_string()));
    assert!(!matches!(decoded.kind, Kind::A(_)));
    assert!(!matches!(decoded.kind, Kind::Unset));
}

#[test]
fn unset_oneof_is_the_default_and_suppressed_on_the_wire() {
    let empty = Shape { kind: Kind::Unset };
    assert!(ShapeBinaryCodec.encode_to_vec(&empty).is_empty());
    let decoded = ShapeBinaryCodec.decode(&mut BufferCursor::from_vec(Vec::new())).unwrap();
    assert_eq!(decoded.kind, Kind::Unset);
}

#[test]
fn boundaries_round_trip_with_mixed_signed_and_unsigned_extremes() {
    binary_round_trips(
        &BoundariesBinaryCodec,
        &Boundaries {
            signed32: i32::MIN,
            signed64: i64::MAX,
            unsigned32: u32::MAX,
            unsigned64: 0,
            payload: protolith::ByteSlice::EMPTY,
        },
    );
}

mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn event_round_trips_for_any_seconds_and_nanos(seconds: i64, nanos: i32) {
            binary_round_trips(&EventBinaryCodec, &Event { seconds, nanos });
        }

        #[test]
        fn defaults_round_trips_for_any_int_and_string(a: i32, b: String) {
            binary_round_trips(&DefaultsBinaryCodec, &Defaults { a, b });
        }

        #[test]
        fn boundaries_round_trips_for_any_extremes(
            signed32: i32,
            signed64: i64,
            unsigned32: u32,
            unsigned64: u64,
            payload in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            binary_round_trips(
                &BoundariesBinaryCodec,
                &Boundaries {
                    signed32,
                    signed64,
                    unsigned32,
                    unsigned64,
                    payload: protolith::ByteSlice::copy_from_slice(&payload),
                },
            );
        }

        #[test]
        fn packed_and_unpacked_repeated_encodings_decode_identically(
            values in proptest::collection::vec(any::<i32>(), 0..16),
        ) {
            let packed_wire = PackedRepeatedBinaryCodec.encode_to_vec(&PackedRepeated { values: values.clone() });

            let mut unpacked_wire = BufferCursor::with_capacity(4096);
            for v in &values {
                protolith::wire::encode_key(&mut unpacked_wire, 100, protolith::wire::WireType::Varint).unwrap();
                unpacked_wire.write_varint(*v as i64 as u64).unwrap();
            }
            unpacked_wire.flip();

            let from_packed = PackedRepeatedBinaryCodec
                .decode(&mut BufferCursor::from_vec(packed_wire))
                .unwrap();
            let from_unpacked = PackedRepeatedBinaryCodec.decode(&mut unpacked_wire).unwrap();
            prop_assert_eq!(&from_packed.values, &values);
            prop_assert_eq!(from_unpacked.values, from_packed.values);
        }
    }
}
