//! Scalar field classification and the wire-level code fragments shared by
//! every singular, repeated, and `oneof` variant emission path.
//!
//! A [`ScalarKind`] captures everything about a Protobuf scalar type that
//! doesn't depend on its position in a message: the Rust type it maps to,
//! its wire type, and how to read/write one value's content once a tag has
//! already been handled by the caller. Message- and oneof-field generation
//! build the surrounding presence checks (default suppression, `Option`
//! wrapping, tag emission) on top of these fragments so the wire-format
//! details live in exactly one place.

use prost_types::field_descriptor_proto::Type;
use proc_macro2::TokenStream;
use quote::quote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ScalarKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
}

impl ScalarKind {
    /// `None` for `String`, `Bytes`, `Message`, `Group`, and `Enum`, which
    /// each need handling beyond a fixed-width/varint scalar.
    pub(super) fn from_proto_type(ty: Type) -> Option<ScalarKind> {
        Some(match ty {
            Type::Double => ScalarKind::Double,
            Type::Float => ScalarKind::Float,
            Type::Int32 => ScalarKind::Int32,
            Type::Int64 => ScalarKind::Int64,
            Type::Uint32 => ScalarKind::Uint32,
            Type::Uint64 => ScalarKind::Uint64,
            Type::Sint32 => ScalarKind::Sint32,
            Type::Sint64 => ScalarKind::Sint64,
            Type::Fixed32 => ScalarKind::Fixed32,
            Type::Fixed64 => ScalarKind::Fixed64,
            Type::Sfixed32 => ScalarKind::Sfixed32,
            Type::Sfixed64 => ScalarKind::Sfixed64,
            Type::Bool => ScalarKind::Bool,
            Type::String | Type::Bytes | Type::Message | Type::Group | Type::Enum => return None,
        })
    }

    /// Packable per the proto3 `packed` rule: every scalar type except the
    /// two length-delimited ones (`string`/`bytes` aren't `ScalarKind` at
    /// all, so this is always `true`).
    pub(super) fn is_packable(&self) -> bool {
        true
    }

    pub(super) fn rust_type(&self) -> TokenStream {
        match self {
            ScalarKind::Double => quote!(f64),
            ScalarKind::Float => quote!(f32),
            ScalarKind::Int32 | ScalarKind::Sint32 | ScalarKind::Sfixed32 => quote!(i32),
            ScalarKind::Int64 | ScalarKind::Sint64 | ScalarKind::Sfixed64 => quote!(i64),
            ScalarKind::Uint32 | ScalarKind::Fixed32 => quote!(u32),
            ScalarKind::Uint64 | ScalarKind::Fixed64 => quote!(u64),
            ScalarKind::Bool => quote!(bool),
        }
    }

    pub(super) fn wire_type(&self) -> TokenStream {
        match self {
            ScalarKind::Double | ScalarKind::Fixed64 | ScalarKind::Sfixed64 => {
                quote!(::protolith::wire::WireType::SixtyFourBit)
            }
            ScalarKind::Float | ScalarKind::Fixed32 | ScalarKind::Sfixed32 => {
                quote!(::protolith::wire::WireType::ThirtyTwoBit)
            }
            _ => quote!(::protolith::wire::WireType::Varint),
        }
    }

    pub(super) fn zero_literal(&self) -> TokenStream {
        match self {
            ScalarKind::Double => quote!(0f64),
            ScalarKind::Float => quote!(0f32),
            ScalarKind::Bool => quote!(false),
            _ => quote!(0),
        }
    }

    /// Writes one value's wire content to `writer`. Assumes the field's tag
    /// (if any) has already been written; used for both singular fields and
    /// individual elements of a packed or unpacked repeated field.
    pub(super) fn encode_value(&self, value: &TokenStream) -> TokenStream {
        match self {
            ScalarKind::Double => quote!(writer.write_fixed64(#value.to_bits())?;),
            ScalarKind::Float => quote!(writer.write_fixed32(#value.to_bits())?;),
            ScalarKind::Fixed32 => quote!(writer.write_fixed32(#value)?;),
            ScalarKind::Sfixed32 => quote!(writer.write_fixed32(#value as u32)?;),
            ScalarKind::Fixed64 => quote!(writer.write_fixed64(#value)?;),
            ScalarKind::Sfixed64 => quote!(writer.write_fixed64(#value as u64)?;),
            ScalarKind::Int32 => quote!(writer.write_varint(#value as i64 as u64)?;),
            ScalarKind::Int64 => quote!(writer.write_varint(#value as u64)?;),
            ScalarKind::Uint32 => quote!(writer.write_varint(#value as u64)?;),
            ScalarKind::Uint64 => quote!(writer.write_varint(#value)?;),
            ScalarKind::Sint32 => quote!(writer.write_varint(::protolith::wire::zigzag_encode32(#value) as u64)?;),
            ScalarKind::Sint64 => quote!(writer.write_varint(::protolith::wire::zigzag_encode64(#value))?;),
            ScalarKind::Bool => quote!(writer.write_varint(#value as u64)?;),
        }
    }

    /// An expression (not a statement) that reads one value from `reader`.
    /// Assumes the field's tag has already been read and checked.
    pub(super) fn decode_value(&self) -> TokenStream {
        match self {
            ScalarKind::Double => quote!(f64::from_bits(reader.read_fixed64()?)),
            ScalarKind::Float => quote!(f32::from_bits(reader.read_fixed32()?)),
            ScalarKind::Fixed32 => quote!(reader.read_fixed32()?),
            ScalarKind::Sfixed32 => quote!(reader.read_fixed32()? as i32),
            ScalarKind::Fixed64 => quote!(reader.read_fixed64()?),
            ScalarKind::Sfixed64 => quote!(reader.read_fixed64()? as i64),
            ScalarKind::Int32 => quote!(reader.read_varint()? as i32),
            ScalarKind::Int64 => quote!(reader.read_varint()? as i64),
            ScalarKind::Uint32 => quote!(reader.read_varint()? as u32),
            ScalarKind::Uint64 => quote!(reader.read_varint()?),
            ScalarKind::Sint32 => quote!(::protolith::wire::zigzag_decode32(reader.read_varint()? as u32)),
            ScalarKind::Sint64 => quote!(::protolith::wire::zigzag_decode64(reader.read_varint()?)),
            ScalarKind::Bool => quote!(reader.read_varint()? != 0),
        }
    }

    /// An expression computing the byte length of one value's wire content,
    /// excluding any tag.
    pub(super) fn value_len(&self, value: &TokenStream) -> TokenStream {
        match self {
            ScalarKind::Double | ScalarKind::Fixed64 | ScalarKind::Sfixed64 => quote!(8),
            ScalarKind::Float | ScalarKind::Fixed32 | ScalarKind::Sfixed32 => quote!(4),
            ScalarKind::Bool => quote!(1),
            ScalarKind::Int32 => quote!(::protolith::wire::varint_len(#value as i64 as u64)),
            ScalarKind::Int64 => quote!(::protolith::wire::varint_len(#value as u64)),
            ScalarKind::Uint32 => quote!(::protolith::wire::varint_len(#value as u64)),
            ScalarKind::Uint64 => quote!(::protolith::wire::varint_len(#value)),
            ScalarKind::Sint32 => quote!(::protolith::wire::varint_len(::protolith::wire::zigzag_encode32(#value) as u64)),
            ScalarKind::Sint64 => quote!(::protolith::wire::varint_len(::protolith::wire::zigzag_encode64(#value))),
        }
    }

    /// The canonical JSON mapping calls for 64-bit integer fields (`int64`,
    /// `uint64`, `sint64`, `fixed64`, `sfixed64`) to be quoted strings; every
    /// other numeric field is a bare JSON number.
    pub(super) fn is_json_quoted(&self) -> bool {
        matches!(
            self,
            ScalarKind::Int64 | ScalarKind::Uint64 | ScalarKind::Sint64 | ScalarKind::Fixed64 | ScalarKind::Sfixed64
        )
    }

    pub(super) fn is_unsigned(&self) -> bool {
        matches!(self, ScalarKind::Uint32 | ScalarKind::Uint64 | ScalarKind::Fixed32 | ScalarKind::Fixed64)
    }

    /// Appends `value`'s JSON number (or boolean) literal to `out`, quoting
    /// it first if the canonical mapping calls for a string.
    pub(super) fn encode_json_value(&self, value: &TokenStream) -> TokenStream {
        let push = match self {
            ScalarKind::Bool => quote! {
                out.push_str(if #value { "true" } else { "false" });
            },
            ScalarKind::Float => quote! {
                ::protolith::json::write_json_double(out, #value as f64);
            },
            ScalarKind::Double => quote! {
                ::protolith::json::write_json_double(out, #value);
            },
            _ => quote! {
                out.push_str(&#value.to_string());
            },
        };

        if self.is_json_quoted() {
            quote! {
                out.push('"');
                #push
                out.push('"');
            }
        } else {
            push
        }
    }

    /// Reads one JSON value of this scalar kind, yielding `Option<Type>`
    /// (`None` for an explicit JSON `null`).
    pub(super) fn decode_json_value(&self) -> TokenStream {
        match self {
            ScalarKind::Bool => quote!(lexer.read_boolean()?),
            ScalarKind::Double | ScalarKind::Float => quote!(lexer.read_double()?),
            _ if self.is_unsigned() => quote!(lexer.read_unsigned_integer()?),
            _ => quote!(lexer.read_signed_integer()?),
        }
    }

    /// Converts the `Option<i64|u64|f64|bool>` [`decode_json_value`] yields
    /// down to this kind's native Rust type.
    pub(super) fn json_value_cast(&self, expr: &TokenStream) -> TokenStream {
        match self {
            ScalarKind::Bool => quote!(#expr),
            ScalarKind::Double => quote!(#expr),
            ScalarKind::Float => quote!(#expr as f32),
            _ => {
                let ty = self.rust_type();
                quote!(#expr as #ty)
            }
        }
    }
}
