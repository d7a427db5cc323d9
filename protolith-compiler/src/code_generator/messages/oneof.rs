use super::*;

/// The two declarations a `oneof` contributes to its containing message: the
/// `pub` field on the message struct itself, and the mirror field (same
/// type, no `pub`) on the message's builder.
pub(super) struct OneofFieldDecl {
    pub(super) struct_field: TokenStream,
    pub(super) builder_field: TokenStream,
    pub(super) build_assignment: TokenStream,
    pub(super) default_assignment: TokenStream,
    pub(super) copy_builder_assignment: TokenStream,
}

impl OneofFieldDecl {
    pub(super) fn build_assignment(&self) -> TokenStream {
        self.build_assignment.clone()
    }

    pub(super) fn default_assignment(&self) -> TokenStream {
        self.default_assignment.clone()
    }

    pub(super) fn copy_builder_assignment(&self) -> TokenStream {
        self.copy_builder_assignment.clone()
    }
}

/// The wire-level and JSON dispatch a `oneof` contributes to its containing
/// message's codecs. `merge_arms`/`json_merge_arms` are flattened directly
/// into the parent's top-level `match`, alongside the arms for ordinary
/// fields, since a `oneof` member's field number (or JSON name) is
/// indistinguishable from an ordinary field's at the point of dispatch.
pub(super) struct OneofCodecCode {
    pub(super) encode: TokenStream,
    pub(super) merge_arms: Vec<TokenStream>,
    pub(super) len_arm: TokenStream,
    pub(super) json_encode: TokenStream,
    pub(super) json_merge_arms: Vec<TokenStream>,
}

impl CodeGenerator<'_> {
    pub(super) fn resolve_oneofs(
        &mut self,
        oneof_declarations: &[OneofDescriptorProto],
        mut oneof_fields: OneofFields,
        fq_message_name: &FullyQualifiedName,
    ) -> Vec<TokenStream> {
        let mut oneofs = Vec::with_capacity(oneof_declarations.len());

        for (idx, oneof) in oneof_declarations.iter().enumerate() {
            let idx = idx as i32;
            // optional fields create a synthetic oneof that we want to skip
            let fields = match oneof_fields.remove(&idx) {
                Some(fields) => fields,
                None => continue,
            };
            oneofs.push(self.append_oneof(fq_message_name, oneof, idx, fields));
        }

        oneofs
    }

    pub(super) fn resolve_oneof_fields(
        &mut self,
        oneof_declarations: &[OneofDescriptorProto],
        oneof_fields: &OneofFields,
        message_name: &str,
        fq_message_name: &FullyQualifiedName,
    ) -> Vec<OneofFieldDecl> {
        let mut resolved = Vec::with_capacity(oneof_declarations.len());

        self.path.push(DescriptorLocations::ONEOF_DECL);
        for (idx, oneof) in oneof_declarations.iter().enumerate() {
            let idx = idx as i32;
            if oneof_fields.get_vec(&idx).is_none() {
                continue;
            }

            self.path.push(idx);
            resolved.push(self.resolve_oneof_field(message_name, fq_message_name, oneof));
            self.path.pop();
        }
        self.path.pop();

        resolved
    }

    fn resolve_oneof_field(
        &mut self,
        message_name: &str,
        fq_message_name: &FullyQualifiedName,
        oneof: &OneofDescriptorProto,
    ) -> OneofFieldDecl {
        let documentation = self.resolve_docs(fq_message_name, None);
        let field_attributes = self.resolve_field_attributes(fq_message_name, oneof.name());
        let field_ident = format_ident!("{}", to_snake(oneof.name()));
        let kind_type = oneof_kind_path(message_name, oneof.name());

        OneofFieldDecl {
            struct_field: quote! {
                #(#documentation)*
                #field_attributes
                pub #field_ident: #kind_type
            },
            builder_field: quote! { #field_ident: #kind_type },
            build_assignment: quote! { #field_ident: self.#field_ident },
            default_assignment: quote! { #field_ident: #kind_type::Unset },
            copy_builder_assignment: quote! { #field_ident: self.#field_ident.clone() },
        }
    }

    /// Builds every wire/JSON dispatch fragment this message's `oneof`
    /// declarations contribute, keyed the same way [`resolve_oneof_fields`]
    /// is: one [`OneofCodecCode`] per `oneof` that has at least one member.
    pub(super) fn resolve_oneof_codecs(
        &mut self,
        oneof_declarations: &[OneofDescriptorProto],
        oneof_fields: &OneofFields,
        message_name: &str,
        fq_message_name: &FullyQualifiedName,
    ) -> Vec<OneofCodecCode> {
        let mut codecs = Vec::with_capacity(oneof_declarations.len());

        for (idx, oneof) in oneof_declarations.iter().enumerate() {
            let idx = idx as i32;
            let fields = match oneof_fields.get_vec(&idx) {
                Some(fields) => fields,
                None => continue,
            };
            codecs.push(self.resolve_oneof_codec(message_name, fq_message_name, oneof, fields));
        }

        codecs
    }

    fn resolve_oneof_codec(
        &mut self,
        message_name: &str,
        fq_message_name: &FullyQualifiedName,
        oneof: &OneofDescriptorProto,
        fields: &[(FieldDescriptorProto, usize)],
    ) -> OneofCodecCode {
        let oneof_field_ident = format_ident!("{}", to_snake(oneof.name()));
        let kind_path = oneof_kind_path(message_name, oneof.name());

        let mut encode_arms = Vec::with_capacity(fields.len());
        let mut merge_arms = Vec::with_capacity(fields.len());
        let mut len_arms = Vec::with_capacity(fields.len());
        let mut json_encode_arms = Vec::with_capacity(fields.len());
        let mut json_merge_arms = Vec::with_capacity(fields.len());

        for (field, _) in fields {
            let variant = format_ident!("{}", to_upper_camel(field.name()));
            let number = field.number();
            let json_name = to_json_name(field.name());
            let boxed = self.should_box_field(field, fq_message_name, fq_message_name);

            match field.r#type() {
                Type::Message => {
                    let (_, binary_codec_path, json_codec_path) = self.resolve_message_paths(field);
                    let wrap = if boxed {
                        quote! { ::std::boxed::Box::new(decoded) }
                    } else {
                        quote! { decoded }
                    };
                    let fq_message_name_str = fq_message_name.as_ref().to_string();
                    let field_name_str = field.name().to_string();

                    encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::LengthDelimited)?;
                            #binary_codec_path.encode_length_delimited(v, writer)?;
                        }
                    });
                    merge_arms.push(quote! {
                        #number => {
                            tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                            let mut sub_builder = match &builder.#oneof_field_ident {
                                #kind_path::#variant(existing) => existing.copy_builder(),
                                _ => ::core::default::Default::default(),
                            };
                            #binary_codec_path
                                .merge_length_delimited(&mut sub_builder, reader)
                                .map_err(|e| e.within(#fq_message_name_str, #field_name_str))?;
                            let decoded = ::protolith::message::MessageBuilder::build(sub_builder);
                            builder.#oneof_field_ident = #kind_path::#variant(#wrap);
                        }
                    });
                    len_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            let inner = #binary_codec_path.encoded_len(v);
                            ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(inner as u64) + inner
                        }
                    });
                    json_encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            sep.write_comma_if_needed(out);
                            ::protolith::json::write_field_name(out, #json_name);
                            #json_codec_path.encode_json(v, out)?;
                        }
                    });
                    let pattern = json_match_pattern(&json_name, field.name());
                    json_merge_arms.push(quote! {
                        #pattern => {
                            let decoded = #json_codec_path.decode_json(lexer)?;
                            builder.#oneof_field_ident = #kind_path::#variant(#wrap);
                        }
                    });
                }
                Type::Enum => {
                    let enum_path = self.resolve_type_path(field);

                    encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::Varint)?;
                            writer.write_varint(*v as i64 as u64)?;
                        }
                    });
                    merge_arms.push(quote! {
                        #number => {
                            tag.wire_type.check(::protolith::wire::WireType::Varint)?;
                            builder.#oneof_field_ident = #kind_path::#variant(reader.read_varint()? as i32);
                        }
                    });
                    len_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(*v as i64 as u64)
                        }
                    });
                    json_encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            sep.write_comma_if_needed(out);
                            ::protolith::json::write_field_name(out, #json_name);
                            match <#enum_path as ::core::convert::TryFrom<i32>>::try_from(*v) {
                                ::core::result::Result::Ok(e) => {
                                    out.push('"');
                                    out.push_str(::protolith::json::JsonEnum::name(&e));
                                    out.push('"');
                                }
                                ::core::result::Result::Err(_) => out.push_str(&v.to_string()),
                            }
                        }
                    });
                    let pattern = json_match_pattern(&json_name, field.name());
                    json_merge_arms.push(quote! {
                        #pattern => {
                            if let ::core::option::Option::Some(e) = lexer.read_enum::<#enum_path>()? {
                                builder.#oneof_field_ident = #kind_path::#variant(::protolith::json::JsonEnum::ordinal(&e));
                            }
                        }
                    });
                }
                Type::String => {
                    encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::LengthDelimited)?;
                            ::protolith::wire::LengthDelimitedWriter::write(writer, v.as_bytes())?;
                        }
                    });
                    merge_arms.push(quote! {
                        #number => {
                            tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                            let mut frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                            let frame_len = frame.cursor_mut().remaining();
                            let bytes = frame.cursor_mut().read_bytes(frame_len)?;
                            builder.#oneof_field_ident = #kind_path::#variant(bytes.as_utf8()?.to_string());
                        }
                    });
                    len_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(v.len() as u64) + v.len()
                        }
                    });
                    json_encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            sep.write_comma_if_needed(out);
                            ::protolith::json::write_field_name(out, #json_name);
                            ::protolith::json::write_json_string(out, v);
                        }
                    });
                    let pattern = json_match_pattern(&json_name, field.name());
                    json_merge_arms.push(quote! {
                        #pattern => {
                            if let ::core::option::Option::Some(v) = lexer.read_string()? {
                                builder.#oneof_field_ident = #kind_path::#variant(v);
                            }
                        }
                    });
                }
                Type::Bytes => {
                    encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::encode_key(writer, #number, ::protolith::wire::WireType::LengthDelimited)?;
                            ::protolith::wire::LengthDelimitedWriter::write(writer, v.as_slice())?;
                        }
                    });
                    merge_arms.push(quote! {
                        #number => {
                            tag.wire_type.check(::protolith::wire::WireType::LengthDelimited)?;
                            let mut frame = ::protolith::wire::LengthDelimitedReader::read_from(reader)?;
                            let frame_len = frame.cursor_mut().remaining();
                            let bytes = frame.cursor_mut().read_bytes(frame_len)?;
                            builder.#oneof_field_ident = #kind_path::#variant(bytes);
                        }
                    });
                    len_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::key_len(#number) + ::protolith::wire::varint_len(v.len() as u64) + v.len()
                        }
                    });
                    json_encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            sep.write_comma_if_needed(out);
                            ::protolith::json::write_field_name(out, #json_name);
                            out.push('"');
                            out.push_str(&v.to_base64());
                            out.push('"');
                        }
                    });
                    let pattern = json_match_pattern(&json_name, field.name());
                    json_merge_arms.push(quote! {
                        #pattern => {
                            if let ::core::option::Option::Some(v) = lexer.read_bytes()? {
                                builder.#oneof_field_ident = #kind_path::#variant(v);
                            }
                        }
                    });
                }
                Type::Group => panic!(
                    "field `{}` on oneof `{}` uses the proto2 group encoding, which protolith-compiler does not support",
                    field.name(),
                    oneof.name()
                ),
                _ => {
                    let kind = ScalarKind::from_proto_type(field.r#type())
                        .expect("every non-message, non-enum, non-string, non-bytes field is a scalar");
                    let wire_type = kind.wire_type();
                    let encode_value = kind.encode_value(&quote!(*v));
                    let decode_value = kind.decode_value();
                    let value_len = kind.value_len(&quote!(*v));
                    let json_encode_value = kind.encode_json_value(&quote!(*v));
                    let decode_json_value = kind.decode_json_value();
                    let json_cast = kind.json_value_cast(&quote!(raw));

                    encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            ::protolith::wire::encode_key(writer, #number, #wire_type)?;
                            #encode_value
                        }
                    });
                    merge_arms.push(quote! {
                        #number => {
                            tag.wire_type.check(#wire_type)?;
                            builder.#oneof_field_ident = #kind_path::#variant(#decode_value);
                        }
                    });
                    len_arms.push(quote! {
                        #kind_path::#variant(v) => ::protolith::wire::key_len(#number) + #value_len
                    });
                    json_encode_arms.push(quote! {
                        #kind_path::#variant(v) => {
                            sep.write_comma_if_needed(out);
                            ::protolith::json::write_field_name(out, #json_name);
                            #json_encode_value
                        }
                    });
                    let pattern = json_match_pattern(&json_name, field.name());
                    json_merge_arms.push(quote! {
                        #pattern => {
                            if let ::core::option::Option::Some(raw) = #decode_json_value {
                                builder.#oneof_field_ident = #kind_path::#variant(#json_cast);
                            }
                        }
                    });
                }
            }
        }

        let encode = quote! {
            match &value.#oneof_field_ident {
                #kind_path::Unset => {}
                #(#encode_arms,)*
            }
        };
        let len_arm = quote! {
            len += match &value.#oneof_field_ident {
                #kind_path::Unset => 0,
                #(#len_arms,)*
            };
        };
        let json_encode = quote! {
            match &value.#oneof_field_ident {
                #kind_path::Unset => {}
                #(#json_encode_arms,)*
            }
        };

        OneofCodecCode {
            encode,
            merge_arms,
            len_arm,
            json_encode,
            json_merge_arms,
        }
    }

    fn append_oneof(
        &mut self,
        fq_message_name: &FullyQualifiedName,
        oneof: &OneofDescriptorProto,
        idx: i32,
        fields: Vec<(FieldDescriptorProto, usize)>,
    ) -> TokenStream {
        self.path.push(DescriptorLocations::ONEOF_DECL);
        self.path.push(idx);
        let documentation = self.resolve_docs(fq_message_name, None);
        self.path.pop();
        self.path.pop();

        let oneof_fq_name = fq_message_name.join(oneof.name());
        let enum_attributes = self.resolve_enum_attributes(&oneof_fq_name);
        let maybe_debug = (!self.should_skip_debug(fq_message_name)).then_some(quote! { #[derive(Debug)] });
        let enum_ident = format_ident!("{}", to_upper_camel(oneof.name()));
        let (variants, field_number_arms) = self.oneof_variants(&fields, fq_message_name, &oneof_fq_name);

        quote! {
            #(#documentation)*
            #enum_attributes
            #[derive(Clone, PartialEq, Default)]
            #maybe_debug
            pub enum #enum_ident {
                #[default]
                Unset,
                #(#variants,)*
            }

            impl ::protolith::oneof::OneofKind for #enum_ident {
                fn field_number(&self) -> ::core::option::Option<u32> {
                    match self {
                        Self::Unset => ::core::option::Option::None,
                        #(#field_number_arms,)*
                    }
                }

                fn unset() -> Self {
                    Self::Unset
                }
            }
        }
    }

    fn oneof_variants(
        &mut self,
        fields: &[(FieldDescriptorProto, usize)],
        fq_message_name: &FullyQualifiedName,
        oneof_name: &FullyQualifiedName,
    ) -> (Vec<TokenStream>, Vec<TokenStream>) {
        let mut variants = Vec::with_capacity(fields.len());
        let mut field_number_arms = Vec::with_capacity(fields.len());

        self.path.push(DescriptorLocations::FIELD);
        for (field, idx) in fields {
            self.path.push((*idx).try_into().expect("idx overflow"));
            let documentation = self.resolve_field_docs(fq_message_name, field);
            self.path.pop();

            let field_attributes = self.resolve_field_attributes(oneof_name, field.name());
            let variant_ident = format_ident!("{}", to_upper_camel(field.name()));
            let field_number = field.number();
            let boxed = self.should_box_field(field, fq_message_name, oneof_name);
            let element = self.resolve_element_type(field);

            debug!(
                "    oneof member: {}, boxed: {}",
                field.name(),
                boxed
            );

            let payload = if boxed {
                quote! { ::std::boxed::Box<#element> }
            } else {
                quote! { #element }
            };

            variants.push(quote! {
                #(#documentation)*
                #field_attributes
                #variant_ident(#payload)
            });

            field_number_arms.push(quote! {
                Self::#variant_ident(..) => ::core::option::Option::Some(#field_number)
            });
        }
        self.path.pop();

        (variants, field_number_arms)
    }
}

fn oneof_kind_path(message_name: &str, oneof_name: &str) -> TokenStream {
    format!("{}::{}", to_snake(message_name), to_upper_camel(oneof_name)).parse_syn::<syn::TypePath>().to_token_stream()
}
