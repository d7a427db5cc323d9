//! Errors produced by the binary and JSON codecs, and by the cursor types
//! they read and write through.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::wire::WireType;

/// A Protobuf message decoding error.
///
/// `DecodeError` indicates that the input did not contain a valid encoding
/// of the message being decoded. The error details are best-effort: wire
/// formats are rarely self-describing enough to pinpoint exactly why data is
/// malformed, but the [`path`](DecodeError::path) lets a caller see which
/// nested field was being read when the failure happened.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodeError {
    inner: Box<Inner>,
}

#[derive(Clone, PartialEq, Eq)]
struct Inner {
    kind: DecodeErrorKind,
    path: ErrorPath,
}

impl DecodeError {
    pub fn new(kind: DecodeErrorKind) -> Self {
        DecodeError {
            inner: Box::new(Inner {
                kind,
                path: ErrorPath::new(),
            }),
        }
    }

    /// The root cause of the failure.
    pub fn kind(&self) -> &DecodeErrorKind {
        &self.inner.kind
    }

    /// The logical path, from the innermost field outward, of the field
    /// being decoded when the error occurred.
    pub fn path(&self) -> &ErrorPath {
        &self.inner.path
    }

    /// Records that this error was observed while merging `field` of
    /// `message`. Binary and JSON decoders call this as the error unwinds
    /// out of nested `merge`/`decode` calls, building up a path from the
    /// innermost field outward.
    #[must_use]
    pub fn within(mut self, message: &'static str, field: &'static str) -> Self {
        self.inner.path.push_segment(ErrorPathSegment { message, field });
        self
    }
}

impl From<DecodeErrorKind> for DecodeError {
    fn from(kind: DecodeErrorKind) -> Self {
        DecodeError::new(kind)
    }
}

/// Logical path to the field being decoded when a [`DecodeError`] occurred.
///
/// Segments are pushed from the innermost field outward, so iterating in
/// reverse yields the path from the decode root down to the failure.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ErrorPath {
    segments: Vec<ErrorPathSegment>,
}

impl ErrorPath {
    pub fn new() -> Self {
        ErrorPath {
            segments: Vec::new(),
        }
    }

    pub fn push_segment(&mut self, segment: ErrorPathSegment) {
        self.segments.push(segment);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ErrorPathSegment> {
        self.segments.iter()
    }
}

/// One level of an [`ErrorPath`]: a message type name paired with the field
/// being decoded on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPathSegment {
    message: &'static str,
    field: &'static str,
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeError")
            .field("kind", &self.inner.kind)
            .field("path", &self.inner.path)
            .finish()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to decode protobuf message: {}", self.inner.kind)?;
        for segment in self.path().iter().rev() {
            write!(f, ": {}.{}", segment.message, segment.field)?;
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

#[cfg(feature = "std")]
impl From<DecodeError> for std::io::Error {
    fn from(error: DecodeError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidData, error)
    }
}

/// The root cause of a [`DecodeError`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// A varint ran past 10 continuation bytes, or the 10th byte's high
    /// bits were set.
    InvalidVarint,
    /// A field key decoded to a wire type outside `0..=5`.
    InvalidWireType(u64),
    /// A field key decoded to tag `0`.
    InvalidTag,
    /// A field was present with a wire type that cannot be skipped safely
    /// (neither the field's canonical wire type nor a valid packed
    /// alternative).
    UnexpectedWireType { actual: WireType, expected: WireType },
    /// A read asked for more bytes than remain before the cursor's limit.
    EndOfInput,
    /// A write would exceed a buffer-backed cursor's finite capacity.
    CapacityExceeded { required: usize, remaining: usize },
    /// A length-delimited prefix claimed more bytes than remain in the
    /// input, or a negative/overflowing length.
    BufferUnderflow,
    /// A length-delimited frame did not consume exactly as many bytes as
    /// its prefix promised.
    DelimitedLengthMismatch,
    /// A string field, or a JSON string, contained a byte sequence that is
    /// not valid UTF-8.
    InvalidUtf8,
    /// A JSON `bytes` field was not valid Base64.
    InvalidBase64,
    /// The JSON lexer could not make sense of the input at `offset`.
    JsonParse { offset: usize, message: String },
    /// The decoder's recursion limit was reached while merging a nested
    /// message.
    RecursionLimitReached,
    /// An underlying stream-backed cursor failed.
    #[cfg(feature = "std")]
    Io,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::InvalidVarint => f.write_str("invalid varint"),
            DecodeErrorKind::InvalidWireType(value) => {
                write!(f, "invalid wire type value: {value}")
            }
            DecodeErrorKind::InvalidTag => f.write_str("invalid tag value: 0"),
            DecodeErrorKind::UnexpectedWireType { actual, expected } => {
                write!(f, "invalid wire type: {actual:?} (expected {expected:?})")
            }
            DecodeErrorKind::EndOfInput => f.write_str("end of input"),
            DecodeErrorKind::CapacityExceeded {
                required,
                remaining,
            } => write!(
                f,
                "capacity exceeded (required: {required}, remaining: {remaining})"
            ),
            DecodeErrorKind::BufferUnderflow => f.write_str("buffer underflow"),
            DecodeErrorKind::DelimitedLengthMismatch => {
                f.write_str("delimited length exceeded or under-consumed")
            }
            DecodeErrorKind::InvalidUtf8 => {
                f.write_str("invalid string value: data is not UTF-8 encoded")
            }
            DecodeErrorKind::InvalidBase64 => f.write_str("invalid base64 value"),
            DecodeErrorKind::JsonParse { offset, message } => {
                write!(f, "json parse error at byte {offset}: {message}")
            }
            DecodeErrorKind::RecursionLimitReached => f.write_str("recursion limit reached"),
            #[cfg(feature = "std")]
            DecodeErrorKind::Io => f.write_str("i/o failure"),
        }
    }
}

/// A Protobuf message encoding error.
///
/// Message encoding is infallible except when writing into a finite-capacity
/// buffer-backed cursor that is too small.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncodeError {
    required: usize,
    remaining: usize,
}

impl EncodeError {
    pub fn new(required: usize, remaining: usize) -> EncodeError {
        EncodeError {
            required,
            remaining,
        }
    }

    pub fn required_capacity(&self) -> usize {
        self.required
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "insufficient buffer capacity (required: {}, remaining: {})",
            self.required, self.remaining
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

#[cfg(feature = "std")]
impl From<EncodeError> for std::io::Error {
    fn from(error: EncodeError) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, error)
    }
}

/// An error indicating that an unknown enumeration value was encountered.
///
/// Proto3 enums are open: decoders must accept values outside the declared
/// member set. Generated accessors that need a strict member (as opposed to
/// the raw `i32`) surface this error instead of panicking.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownEnumValue(pub i32);

impl fmt::Display for UnknownEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown enumeration value {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for UnknownEnumValue {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_renders_innermost_first() {
        let err = DecodeError::new(DecodeErrorKind::InvalidVarint)
            .within("pkg.Inner", "count")
            .within("pkg.Outer", "inner");

        assert_eq!(
            err.to_string(),
            "failed to decode protobuf message: invalid varint: pkg.Outer.inner: pkg.Inner.count"
        );
    }
}
