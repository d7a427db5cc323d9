use std::collections::HashMap;
use std::iter;

use itertools::{Either, Itertools};
use log::debug;
use multimap::MultiMap;
use proc_macro2::TokenStream;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    OneofDescriptorProto, SourceCodeInfo,
};
use quote::{format_ident, quote, ToTokens};
use syn::parse::Parser;
use syn::Attribute;

use crate::ast::Comments;
use crate::extern_paths::ExternPaths;
use crate::ident::{strip_enum_prefix, to_snake, to_upper_camel};
use crate::json::ToProtoCamelCase;
use crate::message_graph::MessageGraph;
use crate::syn_helpers::SynHelpers;
use crate::{Config, FullyQualifiedName};

mod enums;
mod field;
use field::ScalarKind;
mod messages;

mod syntax;
use syntax::Syntax;

// IMPROVEMENT: would be nice to have this auto-generated
mod locations;
use locations::*;

/// The canonical protobuf JSON name for a field: its declared name converted to lowerCamelCase.
fn to_json_name(name: &str) -> String {
    name.to_proto_camel_case()
}

/// A `match` pattern accepting either a field's canonical JSON name or its declared proto name,
/// collapsing to a single literal when the two coincide (the common case) to avoid an
/// `unreachable_patterns` warning on the duplicate arm.
fn json_match_pattern(json_name: &str, proto_name: &str) -> TokenStream {
    if json_name == proto_name {
        quote!(#json_name)
    } else {
        quote!(#json_name | #proto_name)
    }
}

pub struct CodeGenerator<'a> {
    config: &'a mut Config,
    package: String,
    type_path: Vec<String>,
    source_info: Option<SourceCodeInfo>,
    syntax: Syntax,
    message_graph: &'a MessageGraph,
    extern_paths: &'a ExternPaths,
    path: Vec<i32>,
    buf: &'a mut String,
}

impl<'a> CodeGenerator<'a> {
    fn new(
        config: &'a mut Config,
        message_graph: &'a MessageGraph,
        extern_paths: &'a ExternPaths,
        source_code_info: Option<SourceCodeInfo>,
        package: Option<String>,
        syntax: Option<String>,
        buf: &'a mut String,
    ) -> Self {
        let source_info = source_code_info.map(|mut s| {
            s.location.retain(|loc| {
                let len = loc.path.len();
                len > 0 && len % 2 == 0
            });
            s.location.sort_by(|a, b| a.path.cmp(&b.path));
            s
        });

        Self {
            config,
            package: package.unwrap_or_default(),
            type_path: Vec::new(),
            source_info,
            syntax: syntax.as_deref().into(),
            message_graph,
            extern_paths,
            path: Vec::new(),
            buf,
        }
    }

    pub fn generate(
        config: &mut Config,
        message_graph: &MessageGraph,
        extern_paths: &ExternPaths,
        file: FileDescriptorProto,
        buf: &mut String,
    ) {
        let mut code_gen = CodeGenerator::new(
            config,
            message_graph,
            extern_paths,
            file.source_code_info,
            file.package,
            file.syntax,
            buf,
        );

        debug!(
            "file: {:?}, package: {:?}",
            file.name.as_ref().unwrap(),
            code_gen.package
        );

        code_gen.push_messages(file.message_type);
        code_gen.push_enums(file.enum_type);
    }

    fn should_skip_debug(&self, fq_message_name: &FullyQualifiedName) -> bool {
        self.config
            .skip_debug
            .get(fq_message_name.as_ref())
            .next()
            .is_some()
    }

    fn parse_attributes<'b>(attrs: impl Iterator<Item = &'b String>) -> Vec<Attribute> {
        attrs
            .flat_map(|attr| {
                Attribute::parse_outer
                    .parse_str(attr)
                    .unwrap_or_else(|error| panic!("invalid attribute {:?}: {}", attr, error))
            })
            .collect()
    }

    fn resolve_type_attributes(&self, fq_name: &FullyQualifiedName) -> Vec<Attribute> {
        Self::parse_attributes(self.config.type_attributes.get(fq_name.as_ref()))
    }

    fn resolve_message_attributes(&self, fq_name: &FullyQualifiedName) -> Vec<Attribute> {
        Self::parse_attributes(self.config.message_attributes.get(fq_name.as_ref()))
    }

    fn resolve_enum_attributes(&self, fq_name: &FullyQualifiedName) -> Vec<Attribute> {
        Self::parse_attributes(self.config.enum_attributes.get(fq_name.as_ref()))
    }

    fn resolve_field_attributes(
        &self,
        fully_qualified_name: &FullyQualifiedName,
        field_name: &str,
    ) -> Vec<Attribute> {
        Self::parse_attributes(
            self.config
                .field_attributes
                .get_field(fully_qualified_name.as_ref(), field_name),
        )
    }

    fn comments_from_location(&self) -> Option<Comments> {
        let source_info = self.source_info.as_ref()?;
        let idx = source_info
            .location
            .binary_search_by_key(&&self.path[..], |location| &location.path[..])
            .ok()?;
        Some(Comments::from_location(&source_info.location[idx]))
    }

    fn resolve_docs(&self, fq_name: &FullyQualifiedName, field_name: Option<&str>) -> Vec<Attribute> {
        let mut comment_string = String::new();
        let disable_comments = &self.config.disable_comments;
        let append_doc = match field_name {
            Some(field_name) => disable_comments.get_field(fq_name.as_ref(), field_name).next(),
            None => disable_comments.get(fq_name.as_ref()).next(),
        }
        .is_none();

        if append_doc {
            if let Some(comments) = self.comments_from_location() {
                comments.append_with_indent(0, &mut comment_string);
            }
        }

        match comment_string.is_empty() {
            true => Vec::new(),
            false => Attribute::parse_outer
                .parse_str(&comment_string)
                .expect("unable to parse comment attribute"),
        }
    }

    /// Field docs, prefixed with the field's wire number in bold so callers reading the
    /// generated struct can match it back to the wire format without consulting the `.proto`.
    fn resolve_field_docs(
        &self,
        fq_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
    ) -> Vec<Attribute> {
        let mut comment_string = format!("/// **{}.**\n", field.number());

        let disable_comments = &self.config.disable_comments;
        let append_doc = disable_comments
            .get_field(fq_name.as_ref(), field.name())
            .next()
            .is_none();

        if append_doc {
            if let Some(comments) = self.comments_from_location() {
                comments.append_with_indent(0, &mut comment_string);
            }
        }

        Attribute::parse_outer
            .parse_str(&comment_string)
            .expect("unable to parse comment attribute")
    }

    /// Resolves a fully-qualified Protobuf type name to the Rust path used to reference it from
    /// the current position in the generated module tree.
    fn resolve_ident(&self, pb_ident: &FullyQualifiedName) -> String {
        if let Some(rust_ident) = self.extern_paths.resolve_ident(pb_ident.as_ref()) {
            return rust_ident;
        }

        let mut local_path = self
            .package
            .split('.')
            .chain(self.type_path.iter().map(String::as_str))
            .peekable();

        // If no package is specified the start of the package name will be '.' and split will
        // return an empty string (""), which breaks resolution. Skip it.
        if local_path.peek().map_or(false, |s| s.is_empty()) {
            local_path.next();
        }

        let mut ident_path = pb_ident.path_iterator();
        let ident_type = ident_path.next_back().unwrap();
        let mut ident_path = ident_path.peekable();

        // Skip path elements in common.
        while local_path.peek().is_some() && local_path.peek() == ident_path.peek() {
            local_path.next();
            ident_path.next();
        }

        local_path
            .map(|_| "super".to_string())
            .chain(ident_path.map(to_snake))
            .chain(iter::once(to_upper_camel(ident_type)))
            .join("::")
    }
}
