use alloc::vec::Vec;

use bytes::{Bytes, BytesMut};

use super::{Reader, Writer};
use crate::byte_slice::ByteSlice;
use crate::error::{DecodeError, DecodeErrorKind, EncodeError};

enum Storage {
    /// Owned, growable-up-to-`capacity` storage. Supports both reading and
    /// writing; writing always appends at `position`, so a write after a
    /// backward seek is rejected rather than silently overwriting data size
    /// computations already accounted for.
    Owned(BytesMut),
    /// A read-only view that shares storage with its source. Never
    /// writable: `capacity` equals the view's length.
    Borrowed(Bytes),
}

/// A finite, buffer-backed [`Reader`]/[`Writer`] with the position/limit/
/// capacity contract of a fixed-size buffer: `0 <= position <= limit <=
/// capacity` always holds.
///
/// Two lifecycles are supported:
/// - **Write then flip.** Construct with
///   [`BufferCursor::with_capacity`], write the encoded message, call
///   [`flip`](BufferCursor::flip), then read it back (or hand the
///   `as_slice()` view to something else).
/// - **Read only.** Construct with [`BufferCursor::from_bytes`] (or
///   [`from_vec`](BufferCursor::from_vec), which copies) over already
///   encoded data; `position` starts at `0` and `limit` at the end.
pub struct BufferCursor {
    storage: Storage,
    position: usize,
    limit: usize,
    capacity: usize,
}

impl BufferCursor {
    /// A fresh, empty, writable cursor with a fixed `capacity`. Writes past
    /// `capacity` fail with [`EncodeError`].
    pub fn with_capacity(capacity: usize) -> Self {
        BufferCursor {
            storage: Storage::Owned(BytesMut::with_capacity(capacity)),
            position: 0,
            limit: capacity,
            capacity,
        }
    }

    /// Wraps already-encoded bytes as a read-only view, sharing storage
    /// with `data`.
    pub fn from_bytes(data: Bytes) -> Self {
        let len = data.len();
        BufferCursor {
            storage: Storage::Borrowed(data),
            position: 0,
            limit: len,
            capacity: len,
        }
    }

    /// Wraps an owned `Vec<u8>` as a read-only view without copying again.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self::from_bytes(Bytes::from(data))
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Moves the cursor to `position`. Panics if `position > self.limit()`,
    /// the same precondition `java.nio.Buffer#position(int)` enforces.
    pub fn set_position(&mut self, position: usize) {
        assert!(
            position <= self.limit,
            "position {position} exceeds limit {}",
            self.limit
        );
        self.position = position;
    }

    /// Switches from write mode to read mode: `limit` becomes the current
    /// `position` (the high-water mark written so far), and `position`
    /// returns to the start.
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
    }

    /// Rewinds `position` to `0` without touching `limit`.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    fn readable_slice(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(buf) => &buf[..self.limit.min(buf.len())],
            Storage::Borrowed(bytes) => bytes.as_ref(),
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.readable_slice()[..self.limit]
    }
}

impl Reader for BufferCursor {
    fn remaining(&self) -> usize {
        self.limit - self.position
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        if self.position >= self.limit {
            return Err(DecodeError::new(DecodeErrorKind::EndOfInput));
        }
        let byte = self.readable_slice()[self.position];
        self.position += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> Result<ByteSlice, DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::new(DecodeErrorKind::EndOfInput));
        }
        let start = self.position;
        self.position += len;
        let result = match &self.storage {
            Storage::Owned(buf) => ByteSlice::copy_from_slice(&buf[start..start + len]),
            Storage::Borrowed(bytes) => ByteSlice::from_bytes(bytes.slice(start..start + len)),
        };
        Ok(result)
    }
}

impl Writer for BufferCursor {
    fn write_u8(&mut self, byte: u8) -> Result<(), EncodeError> {
        self.write_bytes(core::slice::from_ref(&byte))
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), EncodeError> {
        let Storage::Owned(buf) = &mut self.storage else {
            return Err(EncodeError::new(data.len(), 0));
        };
        if self.position != buf.len() {
            // Appending after a seek would silently desynchronize `position`
            // from the buffer's logical length; codecs never need this
            // because encoding is always a single size-then-write pass.
            return Err(EncodeError::new(data.len(), 0));
        }
        let remaining = self.capacity.saturating_sub(self.position);
        if data.len() > remaining {
            return Err(EncodeError::new(self.position + data.len(), remaining));
        }
        buf.extend_from_slice(data);
        self.position += data.len();
        if self.position > self.limit {
            self.limit = self.position;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn write_then_flip_then_read() {
        let mut cursor = BufferCursor::with_capacity(16);
        cursor.write_varint(300).unwrap();
        cursor.flip();
        assert_eq!(cursor.read_varint().unwrap(), 300);
        assert!(cursor.is_exhausted().unwrap());
    }

    #[test]
    fn write_past_capacity_fails() {
        let mut cursor = BufferCursor::with_capacity(1);
        cursor.write_u8(1).unwrap();
        assert!(cursor.write_u8(2).is_err());
    }

    #[test]
    fn read_past_limit_fails() {
        let mut cursor = BufferCursor::from_vec(alloc::vec![1, 2]);
        cursor.read_u8().unwrap();
        cursor.read_u8().unwrap();
        assert!(matches!(
            cursor.read_u8().unwrap_err().kind(),
            DecodeErrorKind::EndOfInput
        ));
    }

    #[test]
    fn set_position_allows_reread() {
        let mut cursor = BufferCursor::from_vec(alloc::vec![9, 8, 7]);
        cursor.read_u8().unwrap();
        cursor.set_position(0);
        assert_eq!(cursor.read_u8().unwrap(), 9);
    }

    #[test]
    #[should_panic]
    fn set_position_past_limit_panics() {
        let mut cursor = BufferCursor::from_vec(alloc::vec![1]);
        cursor.set_position(5);
    }

    proptest! {
        #[test]
        fn varint_round_trips(value: u64) {
            let mut cursor = BufferCursor::with_capacity(10);
            cursor.write_varint(value).unwrap();
            cursor.flip();
            prop_assert_eq!(cursor.read_varint().unwrap(), value);
            prop_assert!(cursor.is_exhausted().unwrap());
        }

        #[test]
        fn fixed32_round_trips(value: u32) {
            let mut cursor = BufferCursor::with_capacity(4);
            cursor.write_fixed32(value).unwrap();
            cursor.flip();
            prop_assert_eq!(cursor.read_fixed32().unwrap(), value);
        }

        #[test]
        fn fixed64_round_trips(value: u64) {
            let mut cursor = BufferCursor::with_capacity(8);
            cursor.write_fixed64(value).unwrap();
            cursor.flip();
            prop_assert_eq!(cursor.read_fixed64().unwrap(), value);
        }

        #[test]
        fn arbitrary_byte_payloads_round_trip(data in proptest::collection::vec(any::<u8>(), 0..256)) {
            let mut cursor = BufferCursor::with_capacity(data.len());
            cursor.write_bytes(&data).unwrap();
            cursor.flip();
            prop_assert_eq!(cursor.read_bytes(data.len()).unwrap().as_slice(), data.as_slice());
        }
    }
}
