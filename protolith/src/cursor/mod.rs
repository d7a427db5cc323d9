//! The sequential-data abstraction that every codec reads and writes
//! through.
//!
//! Two concrete cursor kinds compose the capability traits defined here:
//!
//! - [`BufferCursor`] is buffer-backed: it has a finite, known capacity and
//!   supports random access via [`BufferCursor::set_position`].
//! - [`stream::StreamCursor`] is stream-backed: forward-only, with capacity
//!   that may be unbounded.
//!
//! A codec that only needs to read declares its bound as `impl Reader`; one
//! that only writes declares `impl Writer`. Neither capability assumes the
//! other, or assumes buffer-backed storage, so the same generated `encode`
//! method works whether it is filling an in-memory `Vec<u8>` or streaming
//! onto a socket.

mod buffer;
pub mod stream;

pub use buffer::BufferCursor;
pub use stream::StreamCursor;

use crate::byte_slice::ByteSlice;
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};

/// The readable capability: sequential consumption of bytes, with the wire
/// primitives built in terms of [`read_u8`](Reader::read_u8) and
/// [`read_bytes`](Reader::read_bytes).
pub trait Reader {
    /// Bytes available to read before the cursor's limit. Stream-backed
    /// readers that cannot know this in advance return `usize::MAX`; use
    /// [`is_exhausted`](Reader::is_exhausted) to test for end-of-input
    /// instead of comparing against this value.
    fn remaining(&self) -> usize;

    fn read_u8(&mut self) -> Result<u8, DecodeError>;

    /// Reads exactly `len` bytes. Buffer-backed cursors share storage with
    /// the returned [`ByteSlice`] where possible; stream-backed cursors
    /// always copy.
    fn read_bytes(&mut self, len: usize) -> Result<ByteSlice, DecodeError>;

    /// Discards `len` bytes without materializing them.
    fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.read_bytes(len).map(|_| ())
    }

    /// `true` once no further bytes are available. The default
    /// implementation is exact for buffer-backed cursors; stream-backed
    /// cursors override it to peek the underlying stream instead of
    /// trusting [`remaining`](Reader::remaining).
    fn is_exhausted(&mut self) -> Result<bool, DecodeError> {
        Ok(self.remaining() == 0)
    }

    fn read_fixed32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        let mut array = [0u8; 4];
        array.copy_from_slice(bytes.as_slice());
        Ok(u32::from_le_bytes(array))
    }

    fn read_fixed64(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.read_bytes(8)?;
        let mut array = [0u8; 8];
        array.copy_from_slice(bytes.as_slice());
        Ok(u64::from_le_bytes(array))
    }

    /// Reads a little-endian base-128 varint. Fails with
    /// [`DecodeErrorKind::InvalidVarint`] after 10 continuation bytes, or if
    /// the high bits of the 10th byte would overflow a `u64`.
    fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let mut value: u64 = 0;
        for count in 0..10 {
            let byte = self.read_u8()?;
            if count == 9 && byte > 0x01 {
                return Err(DecodeError::new(DecodeErrorKind::InvalidVarint));
            }
            value |= u64::from(byte & 0x7F) << (count * 7);
            if byte < 0x80 {
                return Ok(value);
            }
        }
        Err(DecodeError::new(DecodeErrorKind::InvalidVarint))
    }
}

/// The writable capability: sequential production of bytes.
pub trait Writer {
    fn write_u8(&mut self, byte: u8) -> Result<(), EncodeError>;

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), EncodeError>;

    /// Advances the write cursor by `len` bytes. Buffer-backed writers
    /// reserve the space; stream-backed writers zero-fill it.
    fn skip(&mut self, len: usize) -> Result<(), EncodeError> {
        let zeros = [0u8; 16];
        let mut remaining = len;
        while remaining > 0 {
            let chunk = remaining.min(zeros.len());
            self.write_bytes(&zeros[..chunk])?;
            remaining -= chunk;
        }
        Ok(())
    }

    fn write_fixed32(&mut self, value: u32) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_fixed64(&mut self, value: u64) -> Result<(), EncodeError> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Writes `value` as a little-endian base-128 varint (1 to 10 bytes).
    fn write_varint(&mut self, mut value: u64) -> Result<(), EncodeError> {
        for _ in 0..10 {
            if value < 0x80 {
                self.write_u8(value as u8)?;
                return Ok(());
            }
            self.write_u8(((value & 0x7F) | 0x80) as u8)?;
            value >>= 7;
        }
        Ok(())
    }
}
