//! Wire-format primitives shared by every generated binary codec: tags,
//! wire types, zigzag transforms, and the length-delimited framing rules
//! for packed repeated fields, unknown fields, and duplicate fields.

mod length_delimited;
mod tag;
mod zigzag;

pub use length_delimited::{skip_field, LengthDelimitedReader, LengthDelimitedWriter};
pub use tag::{decode_key, encode_key, key_len, varint_len, Tag, WireType};
pub use zigzag::{zigzag_decode32, zigzag_decode64, zigzag_encode32, zigzag_encode64};
