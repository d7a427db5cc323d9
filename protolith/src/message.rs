//! The contract every generated binary codec implements.
//!
//! A generated message type itself (component F) carries no encode/decode
//! logic; that logic lives in a separate, zero-sized codec type generated
//! alongside it (component G), which implements [`BinaryCodec`]. Splitting
//! the two means the message type stays a plain immutable value -- safe to
//! share across threads, cheap to compare and clone -- while the codec is
//! free to carry per-field dispatch without polluting the value type's own
//! API.

use alloc::vec::Vec;

use crate::cursor::{BufferCursor, Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::wire::{decode_key, LengthDelimitedReader, Tag};

/// The mutable counterpart of a generated message value, used only while
/// decoding. Every generated message type `M` has a corresponding
/// `MBuilder` that implements this trait; [`BinaryCodec::decode`] drives
/// one field at a time via [`BinaryCodec::merge_field`] and calls
/// [`build`](MessageBuilder::build) once the input is exhausted.
///
/// `build` is infallible: proto3 has no required fields, so every builder
/// state is a valid message.
pub trait MessageBuilder: Default {
    type Value;

    fn build(self) -> Self::Value;
}

/// Binary encoding and decoding for one message type.
///
/// Implementations are generated, one per message, as a unit struct named
/// `<Message>BinaryCodec`. The trait is generic over the cursor's
/// [`Reader`]/[`Writer`] capability rather than tied to a concrete buffer
/// type, so the same generated code serves both in-memory and
/// stream-backed codecs.
pub trait BinaryCodec {
    type Value;
    type Builder: MessageBuilder<Value = Self::Value>;

    /// Writes the message's fields, without a length prefix. Called by
    /// every other encode method, and directly by a sub-message field's
    /// parent when writing its own length-delimited content.
    #[doc(hidden)]
    fn encode_raw(&self, value: &Self::Value, writer: &mut impl Writer) -> Result<(), EncodeError>;

    /// Merges one field, identified by an already-decoded `tag`, into
    /// `builder`. Implementations dispatch on `tag.field_number`; an
    /// unrecognized number falls through to
    /// [`skip_field`](crate::wire::skip_field) rather than erroring, per
    /// the unknown-field rule.
    #[doc(hidden)]
    fn merge_field(
        &self,
        builder: &mut Self::Builder,
        tag: Tag,
        reader: &mut impl Reader,
    ) -> Result<(), DecodeError>;

    /// The exact number of bytes [`encode_raw`](BinaryCodec::encode_raw)
    /// will write for `value`, excluding any length prefix. Generated
    /// implementations sum each present field's tag length and content
    /// length, skipping suppressed defaults.
    fn encoded_len(&self, value: &Self::Value) -> usize;

    /// Encodes `value` to `writer`, without a length prefix.
    fn encode(&self, value: &Self::Value, writer: &mut impl Writer) -> Result<(), EncodeError> {
        self.encode_raw(value, writer)
    }

    /// Encodes `value` to a freshly allocated, exactly sized buffer.
    fn encode_to_vec(&self, value: &Self::Value) -> Vec<u8> {
        let len = self.encoded_len(value);
        let mut cursor = BufferCursor::with_capacity(len);
        self.encode_raw(value, &mut cursor)
            .expect("encoded_len underestimated the encoding's size");
        cursor.as_slice().to_vec()
    }

    /// Encodes `value` to `writer` preceded by a varint length prefix, the
    /// framing every embedded sub-message field and every
    /// `decode_length_delimited` caller expects.
    fn encode_length_delimited(&self, value: &Self::Value, writer: &mut impl Writer) -> Result<(), EncodeError> {
        let len = self.encoded_len(value);
        writer.write_varint(len as u64)?;
        self.encode_raw(value, writer)
    }

    /// Decodes a message from `reader`, consuming it until exhaustion.
    fn decode(&self, reader: &mut impl Reader) -> Result<Self::Value, DecodeError> {
        let mut builder = Self::Builder::default();
        while !reader.is_exhausted()? {
            let tag = decode_key(reader)?;
            self.merge_field(&mut builder, tag, reader)?;
        }
        Ok(builder.build())
    }

    /// Decodes a length-delimited message: a varint length prefix followed
    /// by exactly that many bytes of field content.
    fn decode_length_delimited(&self, reader: &mut impl Reader) -> Result<Self::Value, DecodeError> {
        let mut builder = Self::Builder::default();
        self.merge_length_delimited(&mut builder, reader)?;
        Ok(builder.build())
    }

    /// Reads a length-delimited frame from `reader` and merges its fields into an
    /// already-in-progress `builder`, rather than starting from
    /// [`Default`](Self::Builder). A singular message field that occurs more than once on the
    /// wire calls this once per occurrence against the same accumulating builder, which is how
    /// the duplicate-submessage merge rule (later occurrence's scalars overwrite, repeated
    /// fields concatenate, nested messages merge recursively) falls out of ordinary
    /// [`merge_field`](BinaryCodec::merge_field) dispatch instead of needing a separate code
    /// path.
    fn merge_length_delimited(&self, builder: &mut Self::Builder, reader: &mut impl Reader) -> Result<(), DecodeError> {
        let mut frame = LengthDelimitedReader::read_from(reader)?;
        while !frame.cursor_mut().is_exhausted()? {
            let tag = decode_key(frame.cursor_mut())?;
            self.merge_field(builder, tag, frame.cursor_mut())?;
        }
        Ok(())
    }
}

/// JSON encoding and decoding for one message type.
///
/// Implementations are generated, one per message, as a unit struct named
/// `<Message>JsonCodec`, the JSON-mapping counterpart of
/// [`BinaryCodec`]. Unlike the binary codec, JSON encoding writes directly
/// into a `String` rather than through a [`crate::cursor`] capability,
/// since the canonical protobuf JSON mapping has no notion of a
/// length-prefixed frame to pre-size.
pub trait JsonCodec {
    type Value;
    type Builder: MessageBuilder<Value = Self::Value>;

    /// Appends `value`'s JSON object representation to `out`, omitting
    /// fields equal to their proto3 default.
    fn encode_json(&self, value: &Self::Value, out: &mut alloc::string::String) -> Result<(), EncodeError>;

    /// Decodes one field, identified by an already-read JSON field name,
    /// into `builder`. Implementations dispatch on the proto field name;
    /// an unrecognized name falls through to
    /// [`JsonLexer::skip_value`](crate::json::JsonLexer::skip_value)
    /// rather than erroring.
    fn merge_json_field(
        &self,
        builder: &mut Self::Builder,
        field_name: &str,
        lexer: &mut crate::json::JsonLexer,
    ) -> Result<(), DecodeError>;

    /// Encodes `value` to a freshly allocated JSON string.
    fn encode_json_to_string(&self, value: &Self::Value) -> alloc::string::String {
        let mut out = alloc::string::String::new();
        self.encode_json(value, &mut out)
            .expect("encode_json is infallible for well-formed UTF-8 output");
        out
    }

    /// Decodes a message from a JSON object. `null` at the top level
    /// yields the all-defaults instance, the same treatment every
    /// individually-null field receives.
    fn decode_json(&self, lexer: &mut crate::json::JsonLexer) -> Result<Self::Value, DecodeError> {
        let mut builder = Self::Builder::default();
        let mut empty = lexer.open_object_or_empty()?;
        while !empty {
            let field_name = lexer.read_raw_string()?;
            lexer.consume_colon()?;
            self.merge_json_field(&mut builder, &field_name, lexer)?;
            empty = lexer.next_field_or_close(b'}')? == crate::json::FieldOrClose::Closed;
        }
        Ok(builder.build())
    }

    /// Decodes a message from a complete JSON document.
    fn decode_json_str(&self, input: &str) -> Result<Self::Value, DecodeError> {
        let mut lexer = crate::json::JsonLexer::new(input);
        self.decode_json(&mut lexer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;
    use crate::wire::WireType;

    #[derive(Default, Clone, PartialEq, Debug)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Default)]
    struct PointBuilder {
        x: i32,
        y: i32,
    }

    impl MessageBuilder for PointBuilder {
        type Value = Point;

        fn build(self) -> Point {
            Point {
                x: self.x,
                y: self.y,
            }
        }
    }

    struct PointBinaryCodec;

    impl BinaryCodec for PointBinaryCodec {
        type Value = Point;
        type Builder = PointBuilder;

        fn encode_raw(&self, value: &Point, writer: &mut impl Writer) -> Result<(), EncodeError> {
            if value.x != 0 {
                crate::wire::encode_key(writer, 1, WireType::Varint)?;
                writer.write_varint(crate::wire::zigzag_encode32(value.x) as u64)?;
            }
            if value.y != 0 {
                crate::wire::encode_key(writer, 2, WireType::Varint)?;
                writer.write_varint(crate::wire::zigzag_encode32(value.y) as u64)?;
            }
            Ok(())
        }

        fn merge_field(
            &self,
            builder: &mut PointBuilder,
            tag: Tag,
            reader: &mut impl Reader,
        ) -> Result<(), DecodeError> {
            match tag.field_number {
                1 => {
                    tag.wire_type.check(WireType::Varint)?;
                    builder.x = crate::wire::zigzag_decode32(reader.read_varint()? as u32);
                }
                2 => {
                    tag.wire_type.check(WireType::Varint)?;
                    builder.y = crate::wire::zigzag_decode32(reader.read_varint()? as u32);
                }
                _ => crate::wire::skip_field(tag.wire_type, reader)?,
            }
            Ok(())
        }

        fn encoded_len(&self, value: &Point) -> usize {
            let mut len = 0;
            if value.x != 0 {
                len += 1 + varint_len(crate::wire::zigzag_encode32(value.x) as u64);
            }
            if value.y != 0 {
                len += 1 + varint_len(crate::wire::zigzag_encode32(value.y) as u64);
            }
            len
        }
    }

    fn varint_len(mut value: u64) -> usize {
        let mut len = 1;
        while value >= 0x80 {
            value >>= 7;
            len += 1;
        }
        len
    }

    #[test]
    fn round_trips_through_encode_and_decode() {
        let codec = PointBinaryCodec;
        let point = Point { x: -5, y: 12 };
        let bytes = codec.encode_to_vec(&point);
        let mut cursor = BufferCursor::from_vec(bytes);
        let decoded = codec.decode(&mut cursor).unwrap();
        assert_eq!(decoded, point);
    }

    #[test]
    fn default_fields_are_suppressed() {
        let codec = PointBinaryCodec;
        let origin = Point { x: 0, y: 0 };
        assert_eq!(codec.encoded_len(&origin), 0);
        assert!(codec.encode_to_vec(&origin).is_empty());
    }

    #[test]
    fn unknown_fields_are_skipped_not_errors() {
        let codec = PointBinaryCodec;
        let mut cursor = BufferCursor::with_capacity(32);
        crate::wire::encode_key(&mut cursor, 99, WireType::Varint).unwrap();
        cursor.write_varint(42).unwrap();
        crate::wire::encode_key(&mut cursor, 1, WireType::Varint).unwrap();
        cursor.write_varint(crate::wire::zigzag_encode32(7) as u64).unwrap();
        cursor.flip();

        let decoded = codec.decode(&mut cursor).unwrap();
        assert_eq!(decoded.x, 7);
    }

    #[test]
    fn length_delimited_round_trip() {
        let codec = PointBinaryCodec;
        let point = Point { x: 1, y: -1 };
        let mut cursor = BufferCursor::with_capacity(32);
        codec.encode_length_delimited(&point, &mut cursor).unwrap();
        cursor.flip();
        let decoded = codec.decode_length_delimited(&mut cursor).unwrap();
        assert_eq!(decoded, point);
    }

    #[test]
    fn mismatched_wire_type_is_reported() {
        let codec = PointBinaryCodec;
        let mut cursor = BufferCursor::with_capacity(32);
        crate::wire::encode_key(&mut cursor, 1, WireType::LengthDelimited).unwrap();
        cursor.write_varint(0).unwrap();
        cursor.flip();

        let err = codec.decode(&mut cursor).unwrap_err();
        assert!(matches!(
            err.kind(),
            DecodeErrorKind::UnexpectedWireType {
                actual: WireType::LengthDelimited,
                expected: WireType::Varint,
            }
        ));
    }

    #[derive(Default, Clone, PartialEq, Debug)]
    struct Wrapper {
        inner: Option<Point>,
    }

    #[derive(Default)]
    struct WrapperBuilder {
        inner: Option<Point>,
    }

    impl MessageBuilder for WrapperBuilder {
        type Value = Wrapper;

        fn build(self) -> Wrapper {
            Wrapper { inner: self.inner }
        }
    }

    struct WrapperBinaryCodec;

    impl BinaryCodec for WrapperBinaryCodec {
        type Value = Wrapper;
        type Builder = WrapperBuilder;

        fn encode_raw(&self, value: &Wrapper, writer: &mut impl Writer) -> Result<(), EncodeError> {
            if let Some(inner) = &value.inner {
                crate::wire::encode_key(writer, 1, WireType::LengthDelimited)?;
                PointBinaryCodec.encode_length_delimited(inner, writer)?;
            }
            Ok(())
        }

        fn merge_field(
            &self,
            builder: &mut WrapperBuilder,
            tag: Tag,
            reader: &mut impl Reader,
        ) -> Result<(), DecodeError> {
            match tag.field_number {
                1 => {
                    tag.wire_type.check(WireType::LengthDelimited)?;
                    // Re-derive a builder from whatever's already there (if anything), so a
                    // second occurrence of this field merges onto the first rather than
                    // replacing it outright.
                    let mut sub_builder = match &builder.inner {
                        Some(existing) => PointBuilder {
                            x: existing.x,
                            y: existing.y,
                        },
                        None => PointBuilder::default(),
                    };
                    PointBinaryCodec.merge_length_delimited(&mut sub_builder, reader)?;
                    builder.inner = Some(sub_builder.build());
                }
                _ => crate::wire::skip_field(tag.wire_type, reader)?,
            }
            Ok(())
        }

        fn encoded_len(&self, value: &Wrapper) -> usize {
            match &value.inner {
                Some(inner) => {
                    let inner_len = PointBinaryCodec.encoded_len(inner);
                    crate::wire::key_len(1) + crate::wire::varint_len(inner_len as u64) + inner_len
                }
                None => 0,
            }
        }
    }

    #[test]
    fn duplicate_submessage_occurrences_merge_fields() {
        let codec = WrapperBinaryCodec;
        let mut cursor = BufferCursor::with_capacity(64);
        crate::wire::encode_key(&mut cursor, 1, WireType::LengthDelimited).unwrap();
        PointBinaryCodec
            .encode_length_delimited(&Point { x: 1, y: 2 }, &mut cursor)
            .unwrap();
        // Second occurrence only carries `x` (`y` is its default, so it's suppressed on the
        // wire); the merged result should keep `y` from the first occurrence.
        crate::wire::encode_key(&mut cursor, 1, WireType::LengthDelimited).unwrap();
        PointBinaryCodec
            .encode_length_delimited(&Point { x: 9, y: 0 }, &mut cursor)
            .unwrap();
        cursor.flip();

        let decoded = codec.decode(&mut cursor).unwrap();
        assert_eq!(decoded.inner, Some(Point { x: 9, y: 2 }));
    }

    struct PointJsonCodec;

    impl JsonCodec for PointJsonCodec {
        type Value = Point;
        type Builder = PointBuilder;

        fn encode_json(&self, value: &Point, out: &mut alloc::string::String) -> Result<(), EncodeError> {
            use crate::json::{write_field_name, FieldSeparator};
            out.push('{');
            let mut sep = FieldSeparator::new();
            if value.x != 0 {
                sep.write_comma_if_needed(out);
                write_field_name(out, "x");
                out.push_str(&value.x.to_string());
            }
            if value.y != 0 {
                sep.write_comma_if_needed(out);
                write_field_name(out, "y");
                out.push_str(&value.y.to_string());
            }
            out.push('}');
            Ok(())
        }

        fn merge_json_field(
            &self,
            builder: &mut PointBuilder,
            field_name: &str,
            lexer: &mut crate::json::JsonLexer,
        ) -> Result<(), DecodeError> {
            match field_name {
                "x" => {
                    if let Some(value) = lexer.read_signed_integer()? {
                        builder.x = value as i32;
                    }
                }
                "y" => {
                    if let Some(value) = lexer.read_signed_integer()? {
                        builder.y = value as i32;
                    }
                }
                _ => lexer.skip_value()?,
            }
            Ok(())
        }
    }

    #[test]
    fn json_round_trips_through_encode_and_decode() {
        let codec = PointJsonCodec;
        let point = Point { x: -5, y: 12 };
        let json = codec.encode_json_to_string(&point);
        assert_eq!(json, "{\"x\":-5,\"y\":12}");
        let decoded = codec.decode_json_str(&json).unwrap();
        assert_eq!(decoded, point);
    }

    #[test]
    fn json_default_fields_are_omitted() {
        let codec = PointJsonCodec;
        assert_eq!(codec.encode_json_to_string(&Point { x: 0, y: 0 }), "{}");
    }

    #[test]
    fn json_unknown_fields_are_skipped() {
        let codec = PointJsonCodec;
        let decoded = codec
            .decode_json_str("{\"x\":7,\"unknown\":{\"nested\":[1,2,3]}}")
            .unwrap();
        assert_eq!(decoded.x, 7);
    }
}
