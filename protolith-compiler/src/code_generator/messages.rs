use super::*;

mod oneof;

type OneofFields = MultiMap<i32, (FieldDescriptorProto, usize)>;

/// Every generated code fragment one field contributes to its message: the struct/builder
/// declarations, the fluent setter, and the binary/JSON encode and decode arms. Built once per
/// field by [`CodeGenerator::resolve_field`] and spliced into the surrounding message
/// definition, alongside the equivalent fragments [`messages::oneof`] builds for `oneof`
/// members.
struct ResolvedField {
    struct_field: TokenStream,
    builder_field: TokenStream,
    with_method: TokenStream,
    build_assignment: TokenStream,
    default_assignment: TokenStream,
    copy_builder_assignment: TokenStream,
    encode: TokenStream,
    merge_arms: Vec<TokenStream>,
    len: TokenStream,
    json_encode: TokenStream,
    json_merge_arms: Vec<TokenStream>,
}

/// The non-message value types a field can hold, with everything needed to encode, decode, and
/// JSON-map one value of that type once the surrounding presence/repetition handling has
/// positioned a reader, writer, or lexer. Message fields dispatch to the target message's own
/// `BinaryCodec`/`JsonCodec` instead (see [`CodeGenerator::resolve_message_paths`]), so they
/// have no [`FieldValueKind`] of their own.
enum FieldValueKind {
    Scalar(ScalarKind),
    Enum { enum_path: TokenStream },
    String,
    Bytes,
}

impl FieldValueKind {
    fn rust_type(&self) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.rust_type(),
            FieldValueKind::Enum { .. } => quote!(i32),
            FieldValueKind::String => quote!(::std::string::String),
            FieldValueKind::Bytes => quote!(::protolith::ByteSlice),
        }
    }

    fn default_value(&self) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.zero_literal(),
            FieldValueKind::Enum { .. } => quote!(0),
            FieldValueKind::String => quote!(::std::string::String::new()),
            FieldValueKind::Bytes => quote!(::protolith::ByteSlice::EMPTY),
        }
    }

    fn wire_type(&self) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.wire_type(),
            FieldValueKind::Enum { .. } => quote!(::protolith::wire::WireType::Varint),
            FieldValueKind::String | FieldValueKind::Bytes => {
                quote!(::protolith::wire::WireType::LengthDelimited)
            }
        }
    }

    fn is_length_delimited(&self) -> bool {
        matches!(self, FieldValueKind::String | FieldValueKind::Bytes)
    }

    /// Packable per the proto3 `packed` rule: every scalar and enum field, never `string` or
    /// `bytes` (which are already length-delimited and have no fixed per-element width to pack).
    fn is_packable(&self) -> bool {
        matches!(self, FieldValueKind::Scalar(_) | FieldValueKind::Enum { .. })
    }

    /// Writes one value's wire content. Assumes the tag (if any) is already written.
    fn encode_value(&self, value: &TokenStream) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.encode_value(value),
            FieldValueKind::Enum { .. } => quote!(writer.write_varint(#value as i64 as u64)?;),
            FieldValueKind::String => {
                quote!(::protolith::wire::LengthDelimitedWriter::write(writer, #value.as_bytes())?;)
            }
            FieldValueKind::Bytes => {
                quote!(::protolith::wire::LengthDelimitedWriter::write(writer, #value.as_slice())?;)
            }
        }
    }

    /// An expression reading one value. For `String`/`Bytes`, assumes `reader` already refers to
    /// a cursor positioned over exactly this value's length-delimited frame.
    fn decode_value(&self) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.decode_value(),
            FieldValueKind::Enum { .. } => quote!(reader.read_varint()? as i32),
            FieldValueKind::String => quote! {{
                let frame_len = reader.remaining();
                let bytes = reader.read_bytes(frame_len)?;
                bytes.as_utf8()?.to_string()
            }},
            FieldValueKind::Bytes => quote! {{
                let frame_len = reader.remaining();
                reader.read_bytes(frame_len)?
            }},
        }
    }

    fn value_len(&self, value: &TokenStream) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.value_len(value),
            FieldValueKind::Enum { .. } => quote!(::protolith::wire::varint_len(#value as i64 as u64)),
            // String/Bytes content is itself length-delimited: the varint length prefix
            // `encode_value` writes via `LengthDelimitedWriter::write` counts toward the field's
            // total wire size alongside the raw content bytes.
            FieldValueKind::String | FieldValueKind::Bytes => {
                quote!(::protolith::wire::varint_len(#value.len() as u64) + #value.len())
            }
        }
    }

    fn json_encode_value(&self, value: &TokenStream) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.encode_json_value(value),
            FieldValueKind::Enum { enum_path } => quote! {
                match <#enum_path as ::core::convert::TryFrom<i32>>::try_from(#value) {
                    ::core::result::Result::Ok(e) => {
                        out.push('"');
                        out.push_str(::protolith::json::JsonEnum::name(&e));
                        out.push('"');
                    }
                    ::core::result::Result::Err(_) => out.push_str(&#value.to_string()),
                }
            },
            FieldValueKind::String => quote!(::protolith::json::write_json_string(out, #value);),
            FieldValueKind::Bytes => quote! {
                out.push('"');
                out.push_str(&#value.to_base64());
                out.push('"');
            },
        }
    }

    fn decode_json_value(&self) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.decode_json_value(),
            FieldValueKind::Enum { enum_path } => quote!(lexer.read_enum::<#enum_path>()?),
            FieldValueKind::String => quote!(lexer.read_string()?),
            FieldValueKind::Bytes => quote!(lexer.read_bytes()?),
        }
    }

    /// Converts the raw value [`decode_json_value`](Self::decode_json_value) yields down to this
    /// kind's native Rust type.
    fn json_cast(&self, value: &TokenStream) -> TokenStream {
        match self {
            FieldValueKind::Scalar(kind) => kind.json_value_cast(value),
            FieldValueKind::Enum { .. } => quote!(::protolith::json::JsonEnum::ordinal(&#value)),
            FieldValueKind::String | FieldValueKind::Bytes => quote!(#value),
        }
    }
}

impl CodeGenerator<'_> {
    pub(super) fn push_messages(&mut self, message_types: Vec<DescriptorProto>) {
        self.path.push(FileDescriptorProtoLocations::MESSAGE_TYPE);
        for (idx, message) in message_types.into_iter().enumerate() {
            self.path.push(idx as i32);
            if let Some(resolved_message) = self.resolve_message(message) {
                self.buf.push_str(&resolved_message.to_string());
            }
            self.path.pop();
        }
        self.path.pop();
    }

    fn resolve_messages(&mut self, nested_types: Vec<(DescriptorProto, usize)>) -> Vec<TokenStream> {
        let mut messages = Vec::with_capacity(nested_types.len());

        self.path.push(DescriptorLocations::NESTED_TYPE);
        for (nested_type, idx) in nested_types {
            self.path.push(idx as i32);
            if let Some(message) = self.resolve_message(nested_type) {
                messages.push(message);
            }
            self.path.pop();
        }
        self.path.pop();

        messages
    }

    fn resolve_message(&mut self, message: DescriptorProto) -> Option<TokenStream> {
        debug!("  message: {:?}", message.name());

        let message_name = message.name().to_string();
        let fq_message_name = FullyQualifiedName::new(&self.package, &self.type_path, &message_name);

        // Skip external types.
        if self.extern_paths.resolve_ident(&fq_message_name).is_some() {
            return None;
        }

        // Map fields are rejected by schema validation before code generation runs, so their
        // synthesized `map_entry` nested types never reach this point; every remaining nested
        // type is a plain message.
        type NestedTypes = Vec<(DescriptorProto, usize)>;
        let nested_types: NestedTypes = message.nested_type.into_iter().enumerate().collect();

        // Split the fields into a vector of the normal fields, and oneof fields. `proto3
        // optional` fields arrive wrapped in a synthetic one-member oneof; unwrap those back
        // into plain fields so they generate as `Option<T>` rather than a one-variant enum.
        type Fields = Vec<(FieldDescriptorProto, usize)>;
        let (fields, oneof_fields): (Fields, OneofFields) =
            message.field.into_iter().enumerate().partition_map(|(idx, field)| {
                if field.proto3_optional.unwrap_or(false) {
                    Either::Left((field, idx))
                } else if let Some(oneof_index) = field.oneof_index {
                    Either::Right((oneof_index, (field, idx)))
                } else {
                    Either::Left((field, idx))
                }
            });

        let documentation = self.resolve_docs(&fq_message_name, None);
        let resolved_fields = self.resolve_message_fields(&fields, &fq_message_name);
        let resolved_oneof_fields =
            self.resolve_oneof_fields(&message.oneof_decl, &oneof_fields, &message_name, &fq_message_name);
        let resolved_oneof_codecs = self.resolve_oneof_codecs(
            &message.oneof_decl,
            &oneof_fields,
            &message_name,
            &fq_message_name,
        );

        let ident = format_ident!("{}", to_upper_camel(&message_name));
        let builder_ident = format_ident!("{}Builder", to_upper_camel(&message_name));
        let binary_codec_ident = format_ident!("{}BinaryCodec", to_upper_camel(&message_name));
        let json_codec_ident = format_ident!("{}JsonCodec", to_upper_camel(&message_name));

        let nested = self.recursive_nested(
            &message_name,
            message.enum_type,
            nested_types,
            oneof_fields,
            &message.oneof_decl,
            &fq_message_name,
        );

        let type_attributes = self.resolve_type_attributes(&fq_message_name);
        let message_attributes = self.resolve_message_attributes(&fq_message_name);
        let maybe_debug =
            (!self.should_skip_debug(&fq_message_name)).then_some(quote! { Debug, });

        let struct_fields: Vec<&TokenStream> = resolved_fields.iter().map(|f| &f.struct_field).collect();
        let oneof_struct_fields: Vec<&TokenStream> =
            resolved_oneof_fields.iter().map(|f| &f.struct_field).collect();
        let builder_fields: Vec<&TokenStream> = resolved_fields.iter().map(|f| &f.builder_field).collect();
        let oneof_builder_fields: Vec<&TokenStream> =
            resolved_oneof_fields.iter().map(|f| &f.builder_field).collect();
        let with_methods: Vec<&TokenStream> = resolved_fields.iter().map(|f| &f.with_method).collect();
        let build_assignments: Vec<&TokenStream> =
            resolved_fields.iter().map(|f| &f.build_assignment).collect();
        let default_assignments: Vec<&TokenStream> =
            resolved_fields.iter().map(|f| &f.default_assignment).collect();
        let copy_builder_assignments: Vec<&TokenStream> =
            resolved_fields.iter().map(|f| &f.copy_builder_assignment).collect();
        let encode_stmts: Vec<&TokenStream> = resolved_fields.iter().map(|f| &f.encode).collect();
        let merge_arms: Vec<&TokenStream> = resolved_fields.iter().flat_map(|f| &f.merge_arms).collect();
        let len_stmts: Vec<&TokenStream> = resolved_fields.iter().map(|f| &f.len).collect();
        let json_encode_stmts: Vec<&TokenStream> = resolved_fields.iter().map(|f| &f.json_encode).collect();
        let json_merge_arms: Vec<&TokenStream> =
            resolved_fields.iter().flat_map(|f| &f.json_merge_arms).collect();

        let oneof_build_assignments = oneof_build_assignments(&resolved_oneof_fields);
        let oneof_default_assignments = oneof_default_assignments(&resolved_oneof_fields);
        let oneof_copy_builder_assignments = oneof_copy_builder_assignments(&resolved_oneof_fields);
        let oneof_encodes: Vec<&TokenStream> = resolved_oneof_codecs.iter().map(|c| &c.encode).collect();
        let oneof_merge_arms: Vec<&TokenStream> =
            resolved_oneof_codecs.iter().flat_map(|c| &c.merge_arms).collect();
        let oneof_len_arms: Vec<&TokenStream> = resolved_oneof_codecs.iter().map(|c| &c.len_arm).collect();
        let oneof_json_encodes: Vec<&TokenStream> =
            resolved_oneof_codecs.iter().map(|c| &c.json_encode).collect();
        let oneof_json_merge_arms: Vec<&TokenStream> =
            resolved_oneof_codecs.iter().flat_map(|c| &c.json_merge_arms).collect();

        Some(quote! {
            #(#documentation)*
            #(#type_attributes)*
            #(#message_attributes)*
            #[derive(Clone, #maybe_debug PartialEq)]
            pub struct #ident {
                #(#struct_fields,)*
                #(#oneof_struct_fields,)*
            }

            impl #ident {
                pub const DEFAULT: #ident = #ident {
                    #(#default_assignments,)*
                    #(#oneof_default_assignments,)*
                };

                pub const BINARY_CODEC: #binary_codec_ident = #binary_codec_ident;
                pub const JSON_CODEC: #json_codec_ident = #json_codec_ident;

                /// Seeds a [`#builder_ident`] with this value's fields, for building a modified
                /// copy without re-specifying every field.
                pub fn copy_builder(&self) -> #builder_ident {
                    #builder_ident {
                        #(#copy_builder_assignments,)*
                        #(#oneof_copy_builder_assignments,)*
                    }
                }
            }

            #[derive(Default)]
            pub struct #builder_ident {
                #(#builder_fields,)*
                #(#oneof_builder_fields,)*
            }

            impl #builder_ident {
                #(#with_methods)*
            }

            impl ::protolith::message::MessageBuilder for #builder_ident {
                type Value = #ident;

                fn build(self) -> #ident {
                    #ident {
                        #(#build_assignments,)*
                        #(#oneof_build_assignments,)*
                    }
                }
            }

            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub struct #binary_codec_ident;

            impl ::protolith::message::BinaryCodec for #binary_codec_ident {
                type Value = #ident;
                type Builder = #builder_ident;

                fn encode_raw(
                    &self,
                    value: &#ident,
                    writer: &mut impl ::protolith::cursor::Writer,
                ) -> ::core::result::Result<(), ::protolith::error::EncodeError> {
                    #(#encode_stmts)*
                    #(#oneof_encodes)*
                    Ok(())
                }

                fn merge_field(
                    &self,
                    builder: &mut #builder_ident,
                    tag: ::protolith::wire::Tag,
                    reader: &mut impl ::protolith::cursor::Reader,
                ) -> ::core::result::Result<(), ::protolith::error::DecodeError> {
                    match tag.field_number {
                        #(#merge_arms)*
                        #(#oneof_merge_arms)*
                        _ => ::protolith::wire::skip_field(tag.wire_type, reader)?,
                    }
                    Ok(())
                }

                fn encoded_len(&self, value: &#ident) -> usize {
                    let mut len = 0;
                    #(#len_stmts)*
                    #(#oneof_len_arms)*
                    len
                }
            }

            #[derive(Clone, Copy, Debug, PartialEq, Eq)]
            pub struct #json_codec_ident;

            impl ::protolith::message::JsonCodec for #json_codec_ident {
                type Value = #ident;
                type Builder = #builder_ident;

                fn encode_json(
                    &self,
                    value: &#ident,
                    out: &mut ::std::string::String,
                ) -> ::core::result::Result<(), ::protolith::error::EncodeError> {
                    out.push('{');
                    let mut sep = ::protolith::json::FieldSeparator::new();
                    #(#json_encode_stmts)*
                    #(#oneof_json_encodes)*
                    out.push('}');
                    Ok(())
                }

                fn merge_json_field(
                    &self,
                    builder: &mut #builder_ident,
                    field_name: &str,
                    lexer: &mut ::protolith::json::JsonLexer,
                ) -> ::core::result::Result<(), ::protolith::error::DecodeError> {
                    match field_name {
                        #(#json_merge_arms)*
                        #(#oneof_json_merge_arms)*
                        _ => lexer.skip_value()?,
                    }
                    Ok(())
                }
            }

            #nested
        })
    }

    fn recursive_nested(
        &mut self,
        message_name: &str,
        enum_type: Vec<EnumDescriptorProto>,
        nested_types: Vec<(DescriptorProto, usize)>,
        oneof_fields: OneofFields,
        oneof_declarations: &[OneofDescriptorProto],
        fq_message_name: &FullyQualifiedName,
    ) -> Option<TokenStream> {
        if !enum_type.is_empty() || !nested_types.is_empty() || !oneof_fields.is_empty() {
            let comment = Attribute::parse_outer
                .parse_str(&format!("/// Nested message and enum types in `{}`.", message_name))
                .expect("unable to parse comment");

            let ident = format_ident!("{}", to_snake(message_name));
            self.type_path.push(message_name.to_string());

            let resolved_messages = self.resolve_messages(nested_types);
            let resolved_enums = self.resolve_enums(enum_type);
            let resolved_oneofs = self.resolve_oneofs(oneof_declarations, oneof_fields, fq_message_name);

            self.type_path.pop();

            Some(quote! {
                #(#comment)*
                pub mod #ident {
                    #(#resolved_messages)*
                    #(#resolved_enums)*
                    #(#resolved_oneofs)*
                }
            })
        } else {
            None
        }
    }

    fn resolve_enums(&mut self, enum_types: Vec<EnumDescriptorProto>) -> Vec<TokenStream> {
        let mut enums = Vec::with_capacity(enum_types.len());

        self.path.push(DescriptorLocations::ENUM_TYPE);
        for (idx, enum_type) in enum_types.into_iter().enumerate() {
            self.path.push(idx as i32);
            if let Some(resolved_enum) = self.resolve_enum(enum_type) {
                enums.push(resolved_enum);
            }
            self.path.pop();
        }
        self.path.pop();

        enums
    }

    fn resolve_message_fields(
        &mut self,
        fields: &[(FieldDescriptorProto, usize)],
        fq_message_name: &FullyQualifiedName,
    ) -> Vec<ResolvedField> {
        let mut resolved = Vec::with_capacity(fields.len());

        self.path.push(DescriptorLocations::FIELD);
        for (field, idx) in fields {
            self.path.push(*idx as i32);
            resolved.push(self.resolve_field(fq_message_name, field));
            self.path.pop();
        }
        self.path.pop();

        resolved
    }

    fn resolve_field(
        &mut self,
        fq_message_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
    ) -> ResolvedField {
        debug!("    field: {:?}, type: {:?}", field.name(), field.r#type());

        let repeated = field.label() == Label::Repeated;
        let wrapper_scalar = self.extern_paths.resolve_well_known_scalar(field.type_name());

        match (repeated, field.r#type()) {
            (true, Type::Message) if wrapper_scalar.is_some() => panic!(
                "field `{}` is a repeated `google.protobuf.*Value` wrapper field, which protolith-compiler does not support",
                field.name()
            ),
            (true, Type::Message) => self.resolve_repeated_message_field(fq_message_name, field),
            (true, _) => self.resolve_repeated_scalarish_field(fq_message_name, field),
            (false, Type::Message) => match wrapper_scalar {
                Some(rust_path) => {
                    let kind = Self::wrapper_scalar_kind(field.name(), rust_path);
                    self.resolve_wrapper_scalar_field(fq_message_name, field, kind)
                }
                None => self.resolve_message_field(fq_message_name, field),
            },
            (false, _) => {
                let optional = field.proto3_optional.unwrap_or(false);
                self.resolve_scalar_field(fq_message_name, field, optional)
            }
        }
    }

    /// Maps a `google.protobuf.*Value` wrapper's substituted Rust scalar type (as recorded by
    /// [`ExternPaths::resolve_well_known_scalar`]) back to the [`FieldValueKind`] that drives
    /// [`resolve_wrapper_scalar_field`](Self::resolve_wrapper_scalar_field)'s wire/JSON
    /// fragments. `google.protobuf.Empty` substitutes to `()`, which has no scalar wire
    /// representation to frame a value 1 field around, so it isn't a supported field type either.
    fn wrapper_scalar_kind(field_name: &str, rust_path: &str) -> FieldValueKind {
        match rust_path {
            "bool" => FieldValueKind::Scalar(ScalarKind::Bool),
            "f32" => FieldValueKind::Scalar(ScalarKind::Float),
            "f64" => FieldValueKind::Scalar(ScalarKind::Double),
            "i32" => FieldValueKind::Scalar(ScalarKind::Int32),
            "i64" => FieldValueKind::Scalar(ScalarKind::Int64),
            "u32" => FieldValueKind::Scalar(ScalarKind::Uint32),
            "u64" => FieldValueKind::Scalar(ScalarKind::Uint64),
            "::std::string::String" => FieldValueKind::String,
            "::protolith::ByteSlice" => FieldValueKind::Bytes,
            other => panic!(
                "field `{}` has well-known substituted type `{}`, which has no scalar wire representation",
                field_name, other
            ),
        }
    }

    fn field_value_kind(&self, field: &FieldDescriptorProto) -> FieldValueKind {
        match field.r#type() {
            Type::Enum => FieldValueKind::Enum {
                enum_path: self.resolve_type_path(field),
            },
            Type::String => FieldValueKind::String,
            Type::Bytes => FieldValueKind::Bytes,
            other => FieldValueKind::Scalar(
                ScalarKind::from_proto_type(other)
                    .expect("message and group fields are handled by their own resolve_* methods"),
            ),
        }
    }

    fn resolve_scalar_field(
        &mut self,
        fq_message_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
        optional: bool,
    ) -> ResolvedField {
        let field_ident = format_ident!("{}", to_snake(field.name()));
        let with_ident = format_ident!("with_{}", to_snake(field.name()));
        let number = field.number();
        let json_name = to_json_name(field.name());
        let proto_name = field.name().to_string();
        let pattern = json_match_pattern(&json_name, &proto_name);
        let documentation = self.resolve_field_docs(fq_message_name, field);
        let field_attributes = self.resolve_field_attributes(fq_message_name, field.name());
        let kind = self.field_value_kind(field);

        let elem_type = kind.rust_type();
        let wire_type = kind.wire_type();
        let default_value = kind.default_value();
        let length_delimited = kind.is_length_delimited();

        if optional {
            let rust_type = quote!(::core::option::Option<#elem_type>);
            let encode_value = kind.encode_value(&quote!(v));
            let decode_value = kind.decode_value();
            let value_len = kind.value_len(&quote!(v));
            let json_encode_value = kind.json_encode_value(&quote!(v));
            let decode_json_value = kind.decode_json_value();
            let json_cast = kind.json_cast(&quote!(raw));
            // `Some(v) = &value.field` binds `v` by reference even for Copy scalars (match
            // ergonomics); arithmetic casts in `encode_value`/`value_len` need the value itself,
            // not a reference to it, so re-bind it by copy before using it. String/Bytes methods
            // work the same either way, so this is a no-op for them in practice.
            let copy_out = (!length_delimited).then(|| quote!(let v = *v;));

            let merge_body = if length_delimited {
                quote! {
                    tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                    let mut frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                    let reader = frame.cursor_mut();
                    builder.#field_ident = ::core::option::Option::Some(#decode_value);
                }
            } else {
                quote! {
                    tag.wire_type.check(#wire_type)?;
                    builder.#field_ident = ::core::option::Option::Some(#decode_value);
                }
            };

            ResolvedField {
                struct_field: quote! { #(#documentation)* #field_attributes pub #field_ident: #rust_type },
                builder_field: quote! { #field_ident: #rust_type },
                with_method: quote! {
                    pub fn #with_ident(mut self, value: #elem_type) -> Self {
                        self.#field_ident = ::core::option::Option::Some(value);
                        self
                    }
                },
                build_assignment: quote! { #field_ident: self.#field_ident },
                default_assignment: quote! { #field_ident: ::core::option::Option::None },
                copy_builder_assignment: quote! { #field_ident: self.#field_ident.clone() },
                encode: quote! {
                    if let ::core::option::Option::Some(v) = &value.#field_ident {
                        #copy_out
                        ::protolith::wire::encode_key(writer, #number, #wire_type)?;
                        #encode_value
                    }
                },
                merge_arms: vec![quote! { #number => { #merge_body } }],
                len: quote! {
                    if let ::core::option::Option::Some(v) = &value.#field_ident {
                        #copy_out
                        len += ::protolith::wire::key_len(#number) + #value_len;
                    }
                },
                json_encode: quote! {
                    if let ::core::option::Option::Some(v) = &value.#field_ident {
                        #copy_out
                        sep.write_comma_if_needed(out);
                        ::protolith::json::write_field_name(out, #json_name);
                        #json_encode_value
                    }
                },
                json_merge_arms: vec![quote! {
                    #pattern => {
                        if let ::core::option::Option::Some(raw) = #decode_json_value {
                            builder.#field_ident = ::core::option::Option::Some(#json_cast);
                        }
                    }
                }],
            }
        } else {
            let encode_value = kind.encode_value(&quote!(value.#field_ident));
            let decode_value = kind.decode_value();
            let value_len = kind.value_len(&quote!(value.#field_ident));
            let json_encode_value = kind.json_encode_value(&quote!(value.#field_ident));
            let decode_json_value = kind.decode_json_value();
            let json_cast = kind.json_cast(&quote!(raw));
            let is_string = matches!(kind, FieldValueKind::String);

            let merge_body = if length_delimited {
                quote! {
                    tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                    let mut frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                    let reader = frame.cursor_mut();
                    builder.#field_ident = #decode_value;
                }
            } else {
                quote! {
                    tag.wire_type.check(#wire_type)?;
                    builder.#field_ident = #decode_value;
                }
            };

            let (with_param, with_value) = if is_string {
                (quote!(impl ::core::convert::Into<::std::string::String>), quote!(value.into()))
            } else {
                (elem_type.clone(), quote!(value))
            };

            ResolvedField {
                struct_field: quote! { #(#documentation)* #field_attributes pub #field_ident: #elem_type },
                builder_field: quote! { #field_ident: #elem_type },
                with_method: quote! {
                    pub fn #with_ident(mut self, value: #with_param) -> Self {
                        self.#field_ident = #with_value;
                        self
                    }
                },
                build_assignment: quote! { #field_ident: self.#field_ident },
                default_assignment: quote! { #field_ident: #default_value },
                copy_builder_assignment: quote! { #field_ident: self.#field_ident.clone() },
                encode: quote! {
                    if value.#field_ident != #default_value {
                        ::protolith::wire::encode_key(writer, #number, #wire_type)?;
                        #encode_value
                    }
                },
                merge_arms: vec![quote! { #number => { #merge_body } }],
                len: quote! {
                    if value.#field_ident != #default_value {
                        len += ::protolith::wire::key_len(#number) + #value_len;
                    }
                },
                json_encode: quote! {
                    if value.#field_ident != #default_value {
                        sep.write_comma_if_needed(out);
                        ::protolith::json::write_field_name(out, #json_name);
                        #json_encode_value
                    }
                },
                json_merge_arms: vec![quote! {
                    #pattern => {
                        if let ::core::option::Option::Some(raw) = #decode_json_value {
                            builder.#field_ident = #json_cast;
                        }
                    }
                }],
            }
        }
    }

    /// A `google.protobuf.{Int32,String,Bool,...}Value` field: on the wire this is an ordinary
    /// embedded message (a length-delimited frame containing, at most, its own field 1 holding
    /// the scalar), but [`ExternPaths`] substitutes the wrapper message type for a plain Rust
    /// scalar, so the field surfaces as `Option<T>` rather than `Option<GeneratedWrapperType>`.
    /// The JSON mapping is identical to an ordinary optional scalar field
    /// ([`resolve_scalar_field`](Self::resolve_scalar_field)'s `optional` branch); only the
    /// binary encode/merge/len need the extra inner frame.
    fn resolve_wrapper_scalar_field(
        &mut self,
        fq_message_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
        kind: FieldValueKind,
    ) -> ResolvedField {
        let field_ident = format_ident!("{}", to_snake(field.name()));
        let with_ident = format_ident!("with_{}", to_snake(field.name()));
        let number = field.number();
        let json_name = to_json_name(field.name());
        let proto_name = field.name().to_string();
        let pattern = json_match_pattern(&json_name, &proto_name);
        let documentation = self.resolve_field_docs(fq_message_name, field);
        let field_attributes = self.resolve_field_attributes(fq_message_name, field.name());

        let elem_type = kind.rust_type();
        let inner_wire_type = kind.wire_type();
        let default_value = kind.default_value();
        let length_delimited = kind.is_length_delimited();
        let is_string = matches!(kind, FieldValueKind::String);

        let encode_value = kind.encode_value(&quote!(v));
        let decode_value = kind.decode_value();
        let value_len = kind.value_len(&quote!(v));
        let json_encode_value = kind.json_encode_value(&quote!(v));
        let decode_json_value = kind.decode_json_value();
        let json_cast = kind.json_cast(&quote!(raw));

        // `Some(v) = &value.field` binds `v` by reference regardless of `T`'s `Copy`-ness;
        // non-length-delimited kinds' encode/len fragments do arithmetic casts that need the
        // value itself, so rebind it by copy. String/Bytes fragments already take a reference.
        let copy_out = (!length_delimited).then(|| quote!(let v = *v;));
        let is_default = if length_delimited {
            quote!(*v != #default_value)
        } else {
            quote!(v != #default_value)
        };

        let decode_inner = if length_delimited {
            quote! {{
                let mut inner_frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                let reader = inner_frame.cursor_mut();
                #decode_value
            }}
        } else {
            decode_value.clone()
        };

        let (with_param, with_value) = if is_string {
            (quote!(impl ::core::convert::Into<::std::string::String>), quote!(value.into()))
        } else {
            (elem_type.clone(), quote!(value))
        };

        ResolvedField {
            struct_field: quote! {
                #(#documentation)* #field_attributes pub #field_ident: ::core::option::Option<#elem_type>
            },
            builder_field: quote! { #field_ident: ::core::option::Option<#elem_type> },
            with_method: quote! {
                pub fn #with_ident(mut self, value: #with_param) -> Self {
                    self.#field_ident = ::core::option::Option::Some(#with_value);
                    self
                }
            },
            build_assignment: quote! { #field_ident: self.#field_ident },
            default_assignment: quote! { #field_ident: ::core::option::Option::None },
            copy_builder_assignment: quote! { #field_ident: self.#field_ident.clone() },
            encode: quote! {
                if let ::core::option::Option::Some(v) = &value.#field_ident {
                    ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::LengthDelimited)?;
                    if #is_default {
                        writer.write_varint(0)?;
                    } else {
                        #copy_out
                        writer.write_varint((::protolith::wire::key_len(1) + #value_len) as u64)?;
                        ::protolith::wire::encode_key(writer, 1, #inner_wire_type)?;
                        #encode_value
                    }
                }
            },
            merge_arms: vec![quote! {
                #number => {
                    tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                    let mut frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                    let reader = frame.cursor_mut();
                    let mut inner_value = #default_value;
                    while !reader.is_exhausted()? {
                        let inner_tag = ::protolith::wire::decode_key(reader)?;
                        if inner_tag.field_number == 1 {
                            inner_tag.wire_type.check(#inner_wire_type)?;
                            inner_value = #decode_inner;
                        } else {
                            ::protolith::wire::skip_field(inner_tag.wire_type, reader)?;
                        }
                    }
                    builder.#field_ident = ::core::option::Option::Some(inner_value);
                }
            }],
            len: quote! {
                if let ::core::option::Option::Some(v) = &value.#field_ident {
                    let inner = if #is_default {
                        0
                    } else {
                        #copy_out
                        ::protolith::wire::key_len(1) + #value_len
                    };
                    len += ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(inner as u64) + inner;
                }
            },
            json_encode: quote! {
                if let ::core::option::Option::Some(v) = &value.#field_ident {
                    #copy_out
                    sep.write_comma_if_needed(out);
                    ::protolith::json::write_field_name(out, #json_name);
                    #json_encode_value
                }
            },
            json_merge_arms: vec![quote! {
                #pattern => {
                    if let ::core::option::Option::Some(raw) = #decode_json_value {
                        builder.#field_ident = ::core::option::Option::Some(#json_cast);
                    }
                }
            }],
        }
    }

    fn resolve_repeated_scalarish_field(
        &mut self,
        fq_message_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
    ) -> ResolvedField {
        let field_ident = format_ident!("{}", to_snake(field.name()));
        let with_ident = format_ident!("with_{}", to_snake(field.name()));
        let number = field.number();
        let json_name = to_json_name(field.name());
        let proto_name = field.name().to_string();
        let pattern = json_match_pattern(&json_name, &proto_name);
        let documentation = self.resolve_field_docs(fq_message_name, field);
        let field_attributes = self.resolve_field_attributes(fq_message_name, field.name());
        let kind = self.field_value_kind(field);

        let elem_type = kind.rust_type();
        let wire_type = kind.wire_type();
        let rust_type = quote!(::std::vec::Vec<#elem_type>);
        let packed = kind.is_packable()
            && field.options.as_ref().and_then(|options| options.packed).unwrap_or(true);

        let encode_value = kind.encode_value(&quote!(v));
        let decode_value = kind.decode_value();
        let value_len = kind.value_len(&quote!(v));
        let json_encode_value = kind.json_encode_value(&quote!(v));
        let decode_json_value = kind.decode_json_value();
        let json_cast = kind.json_cast(&quote!(raw));
        let length_delimited_elem = kind.is_length_delimited();
        // `for v in &value.field` and `.iter().map(|v| ...)` both bind `v` as a reference even
        // for Copy scalars; `encode_value`/`value_len` do arithmetic casts that need the value
        // itself. String/Bytes kinds don't need this, their methods already take a reference.
        let copy_out = (!length_delimited_elem).then(|| quote!(let v = *v;));

        let encode = if packed {
            quote! {
                if !value.#field_ident.is_empty() {
                    ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::LengthDelimited)?;
                    let packed_len: usize = value.#field_ident.iter().map(|v| { #copy_out #value_len }).sum();
                    writer.write_varint(packed_len as u64)?;
                    for v in &value.#field_ident {
                        #copy_out
                        #encode_value
                    }
                }
            }
        } else {
            quote! {
                for v in &value.#field_ident {
                    #copy_out
                    ::protolith::wire::encode_key(writer, #number, #wire_type)?;
                    #encode_value
                }
            }
        };

        let len = if packed {
            quote! {
                if !value.#field_ident.is_empty() {
                    let packed_len: usize = value.#field_ident.iter().map(|v| { #copy_out #value_len }).sum();
                    len += ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(packed_len as u64) + packed_len;
                }
            }
        } else {
            quote! {
                for v in &value.#field_ident {
                    #copy_out
                    len += ::protolith::wire::key_len(#number) + #value_len;
                }
            }
        };

        // Proto3 decoders must accept both the packed and unpacked wire representations of a
        // repeated scalar field regardless of how the field itself is declared.
        let merge_body = if length_delimited_elem {
            quote! {
                tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                let mut frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                let reader = frame.cursor_mut();
                builder.#field_ident.push(#decode_value);
            }
        } else {
            quote! {
                if tag.wire_type == ::protolith::wire::WireType::LengthDelimited {
                    let mut frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                    let reader = frame.cursor_mut();
                    while !reader.is_exhausted()? {
                        builder.#field_ident.push(#decode_value);
                    }
                } else {
                    tag.wire_type.check(#wire_type)?;
                    builder.#field_ident.push(#decode_value);
                }
            }
        };

        let json_encode = quote! {
            if !value.#field_ident.is_empty() {
                sep.write_comma_if_needed(out);
                ::protolith::json::write_field_name(out, #json_name);
                out.push('[');
                let mut elem_sep = ::protolith::json::FieldSeparator::new();
                for v in &value.#field_ident {
                    #copy_out
                    elem_sep.write_comma_if_needed(out);
                    #json_encode_value
                }
                out.push(']');
            }
        };

        let json_merge_arms = vec![quote! {
            #pattern => {
                let mut empty = lexer.open_array_or_empty()?;
                while !empty {
                    if let ::core::option::Option::Some(raw) = #decode_json_value {
                        builder.#field_ident.push(#json_cast);
                    }
                    empty = lexer.next_field_or_close(b']')? == ::protolith::json::FieldOrClose::Closed;
                }
            }
        }];

        ResolvedField {
            struct_field: quote! { #(#documentation)* #field_attributes pub #field_ident: #rust_type },
            builder_field: quote! { #field_ident: #rust_type },
            with_method: quote! {
                pub fn #with_ident(mut self, value: #rust_type) -> Self {
                    self.#field_ident = value;
                    self
                }
            },
            build_assignment: quote! { #field_ident: self.#field_ident },
            default_assignment: quote! { #field_ident: ::std::vec::Vec::new() },
            copy_builder_assignment: quote! { #field_ident: self.#field_ident.clone() },
            encode,
            merge_arms: vec![quote! { #number => { #merge_body } }],
            len,
            json_encode,
            json_merge_arms,
        }
    }

    fn resolve_message_field(
        &mut self,
        fq_message_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
    ) -> ResolvedField {
        let field_ident = format_ident!("{}", to_snake(field.name()));
        let with_ident = format_ident!("with_{}", to_snake(field.name()));
        let number = field.number();
        let json_name = to_json_name(field.name());
        let proto_name = field.name().to_string();
        let pattern = json_match_pattern(&json_name, &proto_name);
        let documentation = self.resolve_field_docs(fq_message_name, field);
        let field_attributes = self.resolve_field_attributes(fq_message_name, field.name());
        let boxed = self.should_box_field(field, fq_message_name, fq_message_name);
        let (value_path, binary_codec_path, json_codec_path) = self.resolve_message_paths(field);
        let fq_message_name_str = fq_message_name.as_ref().to_string();
        let field_name_str = field.name().to_string();

        let inner_type = if boxed {
            quote!(::std::boxed::Box<#value_path>)
        } else {
            value_path
        };
        let wrap = if boxed {
            quote!(::std::boxed::Box::new(decoded))
        } else {
            quote!(decoded)
        };
        let rust_type = quote!(::core::option::Option<#inner_type>);

        ResolvedField {
            struct_field: quote! { #(#documentation)* #field_attributes pub #field_ident: #rust_type },
            builder_field: quote! { #field_ident: #rust_type },
            with_method: quote! {
                pub fn #with_ident(mut self, value: #inner_type) -> Self {
                    self.#field_ident = ::core::option::Option::Some(value);
                    self
                }
            },
            build_assignment: quote! { #field_ident: self.#field_ident },
            default_assignment: quote! { #field_ident: ::core::option::Option::None },
            copy_builder_assignment: quote! { #field_ident: self.#field_ident.clone() },
            encode: quote! {
                if let ::core::option::Option::Some(v) = &value.#field_ident {
                    ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::LengthDelimited)?;
                    #binary_codec_path.encode_length_delimited(v, writer)?;
                }
            },
            // A singular embedded-message field that occurs more than once on the wire merges:
            // re-derive a builder from whatever value is already present (if any) via
            // `copy_builder`, merge this occurrence's fields into it, and rebuild.
            merge_arms: vec![quote! {
                #number => {
                    tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                    let mut sub_builder = match builder.#field_ident.take() {
                        ::core::option::Option::Some(existing) => existing.copy_builder(),
                        ::core::option::Option::None => ::core::default::Default::default(),
                    };
                    #binary_codec_path
                        .merge_length_delimited(&mut sub_builder, reader)
                        .map_err(|e| e.within(#fq_message_name_str, #field_name_str))?;
                    let decoded = ::protolith::message::MessageBuilder::build(sub_builder);
                    builder.#field_ident = ::core::option::Option::Some(#wrap);
                }
            }],
            len: quote! {
                if let ::core::option::Option::Some(v) = &value.#field_ident {
                    let inner = #binary_codec_path.encoded_len(v);
                    len += ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(inner as u64) + inner;
                }
            },
            json_encode: quote! {
                if let ::core::option::Option::Some(v) = &value.#field_ident {
                    sep.write_comma_if_needed(out);
                    ::protolith::json::write_field_name(out, #json_name);
                    #json_codec_path.encode_json(v, out)?;
                }
            },
            json_merge_arms: vec![quote! {
                #pattern => {
                    let decoded = #json_codec_path.decode_json(lexer)?;
                    builder.#field_ident = ::core::option::Option::Some(#wrap);
                }
            }],
        }
    }

    fn resolve_repeated_message_field(
        &mut self,
        fq_message_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
    ) -> ResolvedField {
        let field_ident = format_ident!("{}", to_snake(field.name()));
        let with_ident = format_ident!("with_{}", to_snake(field.name()));
        let number = field.number();
        let json_name = to_json_name(field.name());
        let proto_name = field.name().to_string();
        let pattern = json_match_pattern(&json_name, &proto_name);
        let documentation = self.resolve_field_docs(fq_message_name, field);
        let field_attributes = self.resolve_field_attributes(fq_message_name, field.name());
        let (value_path, binary_codec_path, json_codec_path) = self.resolve_message_paths(field);
        let rust_type = quote!(::std::vec::Vec<#value_path>);
        let fq_message_name_str = fq_message_name.as_ref().to_string();
        let field_name_str = field.name().to_string();

        ResolvedField {
            struct_field: quote! { #(#documentation)* #field_attributes pub #field_ident: #rust_type },
            builder_field: quote! { #field_ident: #rust_type },
            with_method: quote! {
                pub fn #with_ident(mut self, value: #rust_type) -> Self {
                    self.#field_ident = value;
                    self
                }
            },
            build_assignment: quote! { #field_ident: self.#field_ident },
            default_assignment: quote! { #field_ident: ::std::vec::Vec::new() },
            copy_builder_assignment: quote! { #field_ident: self.#field_ident.clone() },
            encode: quote! {
                for v in &value.#field_ident {
                    ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::LengthDelimited)?;
                    #binary_codec_path.encode_length_delimited(v, writer)?;
                }
            },
            merge_arms: vec![quote! {
                #number => {
                    tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                    let decoded = #binary_codec_path
                        .decode_length_delimited(reader)
                        .map_err(|e| e.within(#fq_message_name_str, #field_name_str))?;
                    builder.#field_ident.push(decoded);
                }
            }],
            len: quote! {
                for v in &value.#field_ident {
                    let inner = #binary_codec_path.encoded_len(v);
                    len += ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(inner as u64) + inner;
                }
            },
            json_encode: quote! {
                if !value.#field_ident.is_empty() {
                    sep.write_comma_if_needed(out);
                    ::protolith::json::write_field_name(out, #json_name);
                    out.push('[');
                    let mut elem_sep = ::protolith::json::FieldSeparator::new();
                    for v in &value.#field_ident {
                        elem_sep.write_comma_if_needed(out);
                        #json_codec_path.encode_json(v, out)?;
                    }
                    out.push(']');
                }
            },
            json_merge_arms: vec![quote! {
                #pattern => {
                    let mut empty = lexer.open_array_or_empty()?;
                    while !empty {
                        let decoded = #json_codec_path.decode_json(lexer)?;
                        builder.#field_ident.push(decoded);
                        empty = lexer.next_field_or_close(b']')? == ::protolith::json::FieldOrClose::Closed;
                    }
                }
            }],
        }
    }
}

fn oneof_build_assignments(fields: &[OneofFieldDecl]) -> Vec<TokenStream> {
    fields.iter().map(|field| field.build_assignment()).collect()
}

fn oneof_default_assignments(fields: &[OneofFieldDecl]) -> Vec<TokenStream> {
    fields.iter().map(|field| field.default_assignment()).collect()
}

fn oneof_copy_builder_assignments(fields: &[OneofFieldDecl]) -> Vec<TokenStream> {
    fields.iter().map(|field| field.copy_builder_assignment()).collect()
}

// Helpers
impl CodeGenerator<'_> {
    fn should_box_field(
        &self,
        field: &FieldDescriptorProto,
        fq_message_name: &FullyQualifiedName,
        first_field: &FullyQualifiedName,
    ) -> bool {
        ((matches!(field.r#type(), Type::Message | Type::Group))
            && self.message_graph.is_nested(field.type_name(), fq_message_name.as_ref()))
            || (self.config.boxed.get_first_field(first_field, field.name()).is_some())
    }

    /// Resolves a `message`-typed field's target type: the Rust value type, and the const
    /// expressions for its generated `BinaryCodec`/`JsonCodec` instances.
    fn resolve_message_paths(&self, field: &FieldDescriptorProto) -> (TokenStream, TokenStream, TokenStream) {
        let value_path = self.resolve_type_path(field);
        let binary_codec_path = quote!(#value_path::BINARY_CODEC);
        let json_codec_path = quote!(#value_path::JSON_CODEC);
        (value_path, binary_codec_path, json_codec_path)
    }

    /// Resolves an `enum`- or `message`-typed field's target type to the Rust path used to
    /// reference it from the current position in the generated module tree.
    pub(super) fn resolve_type_path(&self, field: &FieldDescriptorProto) -> TokenStream {
        let fq_type_name = FullyQualifiedName::from_type_name(field.type_name());
        self.resolve_ident(&fq_type_name).parse_syn::<syn::Path>().to_token_stream()
    }

    /// The bare Rust type one value of `field` is held as, independent of any `Option`/`Vec`
    /// wrapper a singular or repeated field would otherwise add -- used for a `oneof` variant's
    /// payload, which carries exactly one value of the member field's type.
    pub(super) fn resolve_element_type(&self, field: &FieldDescriptorProto) -> TokenStream {
        match field.r#type() {
            Type::Message => self.resolve_type_path(field),
            // Proto3 enums are open: the wire and in-memory representation of an enum field is
            // always a plain `i32`, never the generated enum type itself.
            Type::Enum => quote!(i32),
            Type::String => quote!(::std::string::String),
            Type::Bytes => quote!(::protolith::ByteSlice),
            other => ScalarKind::from_proto_type(other)
                .expect("group fields are rejected before code generation")
                .rust_type(),
        }
    }
}

use oneof::OneofFieldDecl;
