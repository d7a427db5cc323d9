//! Stream-backed halves of [`Reader`]/[`Writer`], for codecs that read from
//! or write to an unbounded source such as a socket or file, rather than a
//! finite in-memory buffer.

use alloc::vec;
use alloc::vec::Vec;

use super::{Reader, Writer};
use crate::byte_slice::ByteSlice;
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};

/// A forward-only [`Reader`] over a [`std::io::BufRead`].
///
/// Unlike [`super::BufferCursor`], a `StreamCursor` has no notion of a
/// finite capacity: [`remaining`](Reader::remaining) always reports
/// `usize::MAX`, and end-of-input is detected by peeking the underlying
/// stream's fill buffer rather than comparing a position against a limit.
pub struct StreamCursor<R> {
    inner: R,
}

impl<R> StreamCursor<R> {
    pub fn new(inner: R) -> Self {
        StreamCursor { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<R: std::io::BufRead> Reader for StreamCursor<R> {
    fn remaining(&self) -> usize {
        usize::MAX
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        let mut byte = [0u8; 1];
        read_exact(&mut self.inner, &mut byte)?;
        Ok(byte[0])
    }

    fn read_bytes(&mut self, len: usize) -> Result<ByteSlice, DecodeError> {
        let mut buf = vec![0u8; len];
        read_exact(&mut self.inner, &mut buf)?;
        Ok(ByteSlice::from_vec(buf))
    }

    /// Peeks the underlying stream's fill buffer without consuming it, so a
    /// caller can test for end-of-input before attempting a read that would
    /// otherwise fail with [`DecodeErrorKind::EndOfInput`].
    fn is_exhausted(&mut self) -> Result<bool, DecodeError> {
        match self.inner.fill_buf() {
            Ok(buf) => Ok(buf.is_empty()),
            Err(err) => Err(io_decode_error(err)),
        }
    }
}

#[cfg(feature = "std")]
fn read_exact<R: std::io::Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), DecodeError> {
    reader.read_exact(buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            DecodeError::new(DecodeErrorKind::EndOfInput)
        } else {
            io_decode_error(err)
        }
    })
}

#[cfg(feature = "std")]
fn io_decode_error(_err: std::io::Error) -> DecodeError {
    DecodeError::new(DecodeErrorKind::Io)
}

/// A forward-only [`Writer`] over a [`std::io::Write`].
pub struct StreamWriter<W> {
    inner: W,
}

impl<W> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        StreamWriter { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

#[cfg(feature = "std")]
impl<W: std::io::Write> Writer for StreamWriter<W> {
    fn write_u8(&mut self, byte: u8) -> Result<(), EncodeError> {
        self.write_bytes(&[byte])
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        self.inner
            .write_all(data)
            .map_err(|_| EncodeError::new(data.len(), 0))
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn reads_sequentially_and_detects_eof() {
        let data: Vec<u8> = vec![0xAC, 0x02];
        let mut cursor = StreamCursor::new(std::io::BufReader::new(data.as_slice()));
        assert!(!cursor.is_exhausted().unwrap());
        assert_eq!(cursor.read_varint().unwrap(), 300);
        assert!(cursor.is_exhausted().unwrap());
    }

    #[test]
    fn read_past_end_reports_end_of_input() {
        let mut cursor = StreamCursor::new(std::io::BufReader::new([].as_slice()));
        assert!(matches!(
            cursor.read_u8().unwrap_err().kind(),
            DecodeErrorKind::EndOfInput
        ));
    }

    #[test]
    fn writer_round_trips_through_a_vec() {
        let mut out = Vec::new();
        let mut writer = StreamWriter::new(&mut out);
        writer.write_varint(300).unwrap();
        assert_eq!(out, vec![0xAC, 0x02]);
    }
}
