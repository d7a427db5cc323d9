//! `google.protobuf.*Value` fields substitute directly to `Option<scalar>`
//! rather than generating as nested wrapper messages.

use protolith::cursor::BufferCursor;
use protolith::message::{BinaryCodec, JsonCodec};
use protolith_tests::wrappers::{Profile, ProfileBinaryCodec, ProfileJsonCodec};

#[test]
fn wrapper_fields_are_plain_optional_scalars() {
    let profile = Profile {
        nickname: Some("nyx".to_string()),
        age: Some(27),
        verified: Some(true),
    };

    let bytes = ProfileBinaryCodec.encode_to_vec(&profile);
    let decoded = ProfileBinaryCodec.decode(&mut BufferCursor::from_vec(bytes)).unwrap();
    assert_eq!(decoded, profile);
}

#[test]
fn unset_wrapper_fields_are_none_and_absent_from_the_wire() {
    let profile = Profile {
        nickname: None,
        age: None,
        verified: None,
    };
    assert!(ProfileBinaryCodec.encode_to_vec(&profile).is_empty());

    let decoded = ProfileBinaryCodec
        .decode(&mut BufferCursor::from_vec(Vec::new()))
        .unwrap();
    assert_eq!(decoded, profile);
}

#[test]
fn wrapper_fields_round_trip_through_json() {
    let profile = Profile {
        nickname: Some("nyx".to_string()),
        age: Some(27),
        verified: None,
    };
    let json = ProfileJsonCodec.encode_json_to_string(&profile);
    let decoded = ProfileJsonCodec.decode_json_str(&json).unwrap();
    assert_eq!(decoded, profile);
}
