#![doc(html_root_url = "https://docs.rs/protolith/0.1.0")]
#![cfg_attr(not(feature = "std"), no_std)]

//! Runtime support for Protolith-generated code.
//!
//! This crate carries no code generation of its own -- that is
//! `protolith-compiler`'s job. What lives here is everything a generated
//! message type and its codecs are compiled against:
//!
//! - [`byte_slice`]: an immutable, shareable view over a byte region
//!   (component A), the runtime representation of proto3 `bytes` fields.
//! - [`cursor`]: the buffer-backed and stream-backed sequential-access
//!   abstraction every codec reads and writes through (component B).
//! - [`wire`]: tag, varint, zigzag, and length-delimited primitives that
//!   implement the public Protobuf binary encoding (component C).
//! - [`json`]: a minimal tokenizer for canonical protobuf JSON (component
//!   D), driven by generated JSON codecs.
//! - [`message`]: the [`message::BinaryCodec`] and [`message::MessageBuilder`]
//!   traits every generated binary codec implements.
//! - [`oneof`]: the [`oneof::OneofKind`] trait every generated `oneof`
//!   discriminator enum implements.
//! - [`error`]: the error types surfaced by every codec.

extern crate alloc;

pub mod byte_slice;
pub mod cursor;
pub mod error;
pub mod json;
pub mod message;
pub mod oneof;
pub mod wire;

pub use byte_slice::ByteSlice;
pub use error::{DecodeError, DecodeErrorKind, EncodeError};
pub use message::{BinaryCodec, MessageBuilder};
pub use oneof::OneofKind;
