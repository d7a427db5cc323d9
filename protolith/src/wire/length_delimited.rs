//! Length-delimited framing: the wrapper around sub-messages, strings,
//! `bytes`, and packed repeated fields, plus unknown-field skipping.

use crate::byte_slice::ByteSlice;
use crate::cursor::{BufferCursor, Reader, Writer};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};

use super::tag::{decode_key, WireType};

/// A length-delimited field's content, read out as its own [`ByteSlice`]
/// and handed back as a [`BufferCursor`] so the caller (a sub-message
/// decoder, or the packed-repeated element loop) can read from it with the
/// ordinary [`Reader`] methods while this type enforces that exactly the
/// framed number of bytes is consumed.
pub struct LengthDelimitedReader {
    cursor: BufferCursor,
}

impl LengthDelimitedReader {
    /// Reads the length prefix, then the framed content, from `reader`.
    pub fn read_from(reader: &mut impl Reader) -> Result<Self, DecodeError> {
        let len = reader.read_varint()?;
        let len = usize::try_from(len).map_err(|_| DecodeError::new(DecodeErrorKind::BufferUnderflow))?;
        if len > reader.remaining() && reader.remaining() != usize::MAX {
            return Err(DecodeError::new(DecodeErrorKind::BufferUnderflow));
        }
        let bytes: ByteSlice = reader.read_bytes(len)?;
        Ok(LengthDelimitedReader {
            cursor: BufferCursor::from_vec(bytes.to_vec()),
        })
    }

    pub fn cursor_mut(&mut self) -> &mut BufferCursor {
        &mut self.cursor
    }

    /// Verifies the frame was fully consumed. A sub-message decoder that
    /// stops early (trailing unknown bytes within the frame are themselves
    /// legal, per the unknown-field rule) should not call this for every
    /// byte; it is intended for packed-repeated element loops, which must
    /// consume the frame exactly.
    pub fn expect_exhausted(mut self) -> Result<(), DecodeError> {
        if self.cursor.is_exhausted()? {
            Ok(())
        } else {
            Err(DecodeError::new(DecodeErrorKind::DelimitedLengthMismatch))
        }
    }
}

/// Writes a length-delimited field: the varint length of `content`,
/// followed by `content` itself.
pub struct LengthDelimitedWriter;

impl LengthDelimitedWriter {
    pub fn write(writer: &mut impl Writer, content: &[u8]) -> Result<(), EncodeError> {
        writer.write_varint(content.len() as u64)?;
        writer.write_bytes(content)
    }
}

/// Discards the content of an unknown field whose tag has already been
/// read, dispatching on `wire_type`. Unknown fields are never an error;
/// generated decoders call this from their default `match` arm.
pub fn skip_field(wire_type: WireType, reader: &mut impl Reader) -> Result<(), DecodeError> {
    match wire_type {
        WireType::Varint => {
            reader.read_varint()?;
        }
        WireType::SixtyFourBit => {
            reader.read_fixed64()?;
        }
        WireType::ThirtyTwoBit => {
            reader.read_fixed32()?;
        }
        WireType::LengthDelimited => {
            let len = reader.read_varint()?;
            let len = usize::try_from(len).map_err(|_| DecodeError::new(DecodeErrorKind::BufferUnderflow))?;
            reader.skip(len)?;
        }
        WireType::StartGroup => {
            // Proto2 groups are never emitted by a generated encoder, but a
            // decoder must still be able to skip one to stay compatible
            // with peers that predate proto3.
            loop {
                let tag = decode_key(reader)?;
                if tag.wire_type == WireType::EndGroup {
                    break;
                }
                skip_field(tag.wire_type, reader)?;
            }
        }
        WireType::EndGroup => {
            return Err(DecodeError::new(DecodeErrorKind::InvalidTag));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::cursor::BufferCursor;

    #[test]
    fn round_trips_length_delimited_content() {
        let mut cursor = BufferCursor::with_capacity(32);
        LengthDelimitedWriter::write(&mut cursor, b"hello").unwrap();
        cursor.flip();
        let mut frame = LengthDelimitedReader::read_from(&mut cursor).unwrap();
        let bytes = frame.cursor_mut().read_bytes(5).unwrap();
        assert_eq!(bytes.as_slice(), b"hello");
        frame.expect_exhausted().unwrap();
    }

    #[test]
    fn skip_field_handles_every_wire_type() {
        let mut cursor = BufferCursor::with_capacity(64);
        cursor.write_varint(150).unwrap();
        cursor.write_fixed32(1).unwrap();
        cursor.write_fixed64(1).unwrap();
        LengthDelimitedWriter::write(&mut cursor, b"xyz").unwrap();
        cursor.flip();

        skip_field(WireType::Varint, &mut cursor).unwrap();
        skip_field(WireType::ThirtyTwoBit, &mut cursor).unwrap();
        skip_field(WireType::SixtyFourBit, &mut cursor).unwrap();
        skip_field(WireType::LengthDelimited, &mut cursor).unwrap();
        assert!(cursor.is_exhausted().unwrap());
    }

    proptest! {
        #[test]
        fn arbitrary_content_round_trips(content in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut cursor = BufferCursor::with_capacity(content.len() + 10);
            LengthDelimitedWriter::write(&mut cursor, &content).unwrap();
            cursor.flip();
            let mut frame = LengthDelimitedReader::read_from(&mut cursor).unwrap();
            let read = frame.cursor_mut().read_bytes(content.len()).unwrap();
            prop_assert_eq!(read.as_slice(), content.as_slice());
            prop_assert!(frame.expect_exhausted().is_ok());
        }
    }
}
