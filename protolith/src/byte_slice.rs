//! An immutable, shareable view over a region of bytes.
//!
//! `ByteSlice` is the runtime representation of proto3 `bytes` fields. It
//! wraps [`bytes::Bytes`] so that slicing shares the underlying storage
//! instead of copying it -- safe only because nothing can mutate through a
//! `ByteSlice` once constructed.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

use bytes::{Buf, Bytes};

use crate::error::{DecodeError, DecodeErrorKind};

/// An immutable, reference-counted view over a byte region.
///
/// Two `ByteSlice` values are equal, and hash equally, iff their contents
/// are equal; identity of the backing allocation is not observable.
#[derive(Clone, Default)]
pub struct ByteSlice {
    bytes: Bytes,
}

impl ByteSlice {
    /// The distinguished empty byte-slice.
    pub const EMPTY: ByteSlice = ByteSlice {
        bytes: Bytes::new(),
    };

    /// Wraps an owned buffer without copying.
    pub fn from_vec(data: Vec<u8>) -> Self {
        ByteSlice {
            bytes: Bytes::from(data),
        }
    }

    /// Copies a borrowed slice into a new `ByteSlice`.
    pub fn copy_from_slice(data: &[u8]) -> Self {
        ByteSlice {
            bytes: Bytes::copy_from_slice(data),
        }
    }

    pub(crate) fn from_bytes(bytes: Bytes) -> Self {
        ByteSlice { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the byte at `index`, or `None` if `index >= self.len()`.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    pub fn as_slice(&self) -> &[u8] {
        self.bytes.as_ref()
    }

    /// Produces another `ByteSlice` sharing this one's storage. Panics if
    /// `start + len` is out of bounds, matching `[T]` slicing.
    pub fn slice(&self, start: usize, len: usize) -> ByteSlice {
        ByteSlice {
            bytes: self.bytes.slice(start..start + len),
        }
    }

    /// Always copies, producing an owned, independent buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Decodes the contents as strict UTF-8.
    pub fn as_utf8(&self) -> Result<&str, DecodeError> {
        core::str::from_utf8(self.bytes.as_ref())
            .map_err(|_| DecodeError::new(DecodeErrorKind::InvalidUtf8))
    }

    /// Renders the contents as lowercase hex.
    pub fn to_hex(&self) -> String {
        use core::fmt::Write;
        let mut out = String::with_capacity(self.len() * 2);
        for byte in self.bytes.as_ref() {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Renders the contents as standard (padded) Base64, the encoding the
    /// canonical protobuf JSON mapping uses for `bytes` fields.
    pub fn to_base64(&self) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(self.bytes.as_ref())
    }

    /// Parses a Base64 string (standard or URL-safe alphabet, padded or
    /// not) into a `ByteSlice`, per the canonical protobuf JSON mapping's
    /// acceptance rule for incoming data.
    pub fn from_base64(encoded: &str) -> Result<ByteSlice, DecodeError> {
        use base64::Engine;
        let engine = base64::engine::general_purpose::STANDARD_NO_PAD;
        let trimmed = encoded.trim_end_matches('=');
        let normalized: String = trimmed.chars().map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        }).collect();
        engine
            .decode(normalized.as_bytes())
            .map(ByteSlice::from_vec)
            .map_err(|_| DecodeError::new(DecodeErrorKind::InvalidBase64))
    }

    /// Concatenates two byte-slices into a new, copied buffer.
    pub fn concat(&self, other: &ByteSlice) -> ByteSlice {
        let mut out = Vec::with_capacity(self.len() + other.len());
        out.extend_from_slice(self.as_slice());
        out.extend_from_slice(other.as_slice());
        ByteSlice::from_vec(out)
    }

    /// Reads `len` bytes from the front of `buf`, sharing storage with it
    /// when `buf` is itself backed by a `Bytes`.
    pub(crate) fn read_from(buf: &mut impl Buf, len: usize) -> ByteSlice {
        ByteSlice::from_bytes(buf.copy_to_bytes(len))
    }
}

impl PartialEq for ByteSlice {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for ByteSlice {}

impl Hash for ByteSlice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.as_ref().hash(state);
    }
}

impl fmt::Debug for ByteSlice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteSlice({})", self.to_hex())
    }
}

impl From<Vec<u8>> for ByteSlice {
    fn from(data: Vec<u8>) -> Self {
        ByteSlice::from_vec(data)
    }
}

impl From<&[u8]> for ByteSlice {
    fn from(data: &[u8]) -> Self {
        ByteSlice::copy_from_slice(data)
    }
}

impl AsRef<[u8]> for ByteSlice {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl core::ops::Deref for ByteSlice {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}
