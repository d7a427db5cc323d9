use std::collections::{hash_map, HashMap};

use itertools::Itertools;

use crate::ident::{to_snake, to_upper_camel};

fn validate_proto_path(path: &str) -> Result<(), String> {
    if path.chars().next().map(|c| c != '.').unwrap_or(true) {
        return Err(format!(
            "Protobuf paths must be fully qualified (begin with a leading '.'): {}",
            path
        ));
    }
    if path.split('.').skip(1).any(str::is_empty) {
        return Err(format!("invalid fully-qualified Protobuf path: {}", path));
    }
    Ok(())
}

#[derive(Debug)]
struct ExternPathEntry {
    rust_path: String,
    is_well_known: bool,
}

/// Tracks `.google.protobuf.*` wrapper types and any paths registered with
/// [`Config::extern_path`](crate::Config::extern_path), substituting them for a Rust type
/// instead of emitting a generated message for the Protobuf type.
#[derive(Debug)]
pub struct ExternPaths {
    extern_paths: HashMap<String, ExternPathEntry>,
}

impl ExternPaths {
    pub fn new(paths: &[(String, String)], substitute_well_known_types: bool) -> Result<ExternPaths, String> {
        let mut extern_paths = ExternPaths {
            extern_paths: HashMap::new(),
        };

        for (proto_path, rust_path) in paths {
            extern_paths.insert(proto_path.clone(), rust_path.clone(), false)?;
        }

        if substitute_well_known_types {
            extern_paths
                .insert_well_known(".google.protobuf.BoolValue".to_string(), "bool".to_string())?;
            extern_paths.insert_well_known(
                ".google.protobuf.BytesValue".to_string(),
                "::protolith::ByteSlice".to_string(),
            )?;
            extern_paths.insert_well_known(
                ".google.protobuf.DoubleValue".to_string(),
                "f64".to_string(),
            )?;
            extern_paths
                .insert_well_known(".google.protobuf.Empty".to_string(), "()".to_string())?;
            extern_paths
                .insert_well_known(".google.protobuf.FloatValue".to_string(), "f32".to_string())?;
            extern_paths
                .insert_well_known(".google.protobuf.Int32Value".to_string(), "i32".to_string())?;
            extern_paths
                .insert_well_known(".google.protobuf.Int64Value".to_string(), "i64".to_string())?;
            extern_paths.insert_well_known(
                ".google.protobuf.StringValue".to_string(),
                "::std::string::String".to_string(),
            )?;
            extern_paths.insert_well_known(
                ".google.protobuf.UInt32Value".to_string(),
                "u32".to_string(),
            )?;
            extern_paths.insert_well_known(
                ".google.protobuf.UInt64Value".to_string(),
                "u64".to_string(),
            )?;
        }

        Ok(extern_paths)
    }

    fn insert_well_known(&mut self, proto_path: String, rust_path: String) -> Result<(), String> {
        self.insert(proto_path, rust_path, true)
    }

    fn insert(
        &mut self,
        proto_path: String,
        rust_path: String,
        is_well_known: bool,
    ) -> Result<(), String> {
        validate_proto_path(&proto_path)?;
        match self.extern_paths.entry(proto_path) {
            hash_map::Entry::Occupied(occupied) => {
                return Err(format!(
                    "duplicate extern Protobuf path: {}",
                    occupied.key()
                ));
            }
            hash_map::Entry::Vacant(vacant) => vacant.insert(ExternPathEntry {
                rust_path,
                is_well_known,
            }),
        };
        Ok(())
    }

    /// If `pb_ident` names exactly one of the well-known wrapper/`Empty` substitutions (as
    /// opposed to an ordinary `extern_path` entry, or a nested type underneath one), returns the
    /// scalar Rust type it substitutes to. Message-typed fields of this kind need inline scalar
    /// framing rather than a nested message codec, so callers must tell the two cases apart.
    pub fn resolve_well_known_scalar(&self, pb_ident: &str) -> Option<&str> {
        self.extern_paths
            .get(pb_ident)
            .filter(|entry| entry.is_well_known)
            .map(|entry| entry.rust_path.as_str())
    }

    /// Resolves a fully-qualified Protobuf identifier to a Rust path, if an extern mapping
    /// (or a well-known type substitution) covers it or one of its enclosing types.
    pub fn resolve_ident(&self, pb_ident: &str) -> Option<String> {
        // protoc always gives fully qualified identifiers.
        assert_eq!(".", &pb_ident[..1]);

        if let Some(entry) = self.extern_paths.get(pb_ident) {
            return Some(entry.rust_path.clone());
        }

        for (idx, _) in pb_ident.rmatch_indices('.') {
            if let Some(entry) = self.extern_paths.get(&pb_ident[..idx]) {
                let mut segments = pb_ident[idx + 1..].split('.');
                let ident_type = segments.next_back().map(to_upper_camel);

                let rust_path = entry
                    .rust_path
                    .split("::")
                    .chain(segments)
                    .enumerate()
                    .map(|(idx, segment)| {
                        if idx == 0 && segment == "crate" {
                            segment.to_owned()
                        } else {
                            to_snake(segment)
                        }
                    })
                    .chain(ident_type)
                    .join("::");

                return Some(rust_path);
            }
        }

        None
    }
}
