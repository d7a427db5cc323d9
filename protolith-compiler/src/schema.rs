//! Generation-time schema validation.
//!
//! A handful of `.proto` constructs either have no sound Rust representation under this
//! generator's codec model (`group`), aren't implemented (`map`), or would silently corrupt the
//! wire format if allowed through unchecked (reserved-range and duplicate field numbers). Rather
//! than let [`crate::code_generator`] emit something wrong, [`check_file`] rejects these up front
//! with a message that names the offending message and field.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;

use prost_types::field_descriptor_proto::Type;
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};

/// A `.proto` construct this generator cannot, or does not, translate into Rust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// A field declared with the proto2 `group` encoding, which has no independent wire framing
    /// to drive a standalone codec from.
    GroupField { message: String, field: String },
    /// A `map<K, V>` field. Maps are represented on the wire as a repeated entry submessage;
    /// supporting them would require a second collection type (`HashMap`/`BTreeMap`) threaded
    /// through every codegen path that currently only knows `Vec`.
    MapField { message: String, field: String },
    /// A field number that falls inside a `reserved` range declared on its message.
    ReservedNumber {
        message: String,
        field: String,
        number: i32,
    },
    /// A field name that matches a `reserved` name declared on its message.
    ReservedName { message: String, field: String },
    /// Two fields on the same message declaring the same wire field number.
    DuplicateNumber {
        message: String,
        first_field: String,
        second_field: String,
        number: i32,
    },
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::GroupField { message, field } => write!(
                f,
                "message `{}` field `{}` uses the proto2 group encoding, which protolith-compiler does not support",
                message, field
            ),
            SchemaViolation::MapField { message, field } => write!(
                f,
                "message `{}` field `{}` is a map field, which protolith-compiler does not support",
                message, field
            ),
            SchemaViolation::ReservedNumber { message, field, number } => write!(
                f,
                "message `{}` field `{}` uses field number {}, which is reserved",
                message, field, number
            ),
            SchemaViolation::ReservedName { message, field } => write!(
                f,
                "message `{}` field `{}` uses a reserved field name",
                message, field
            ),
            SchemaViolation::DuplicateNumber {
                message,
                first_field,
                second_field,
                number,
            } => write!(
                f,
                "message `{}` fields `{}` and `{}` both use field number {}",
                message, first_field, second_field, number
            ),
        }
    }
}

impl Error for SchemaViolation {}

/// Validates every message in `file`, recursing into nested types. Returns the first violation
/// encountered; there's no benefit to collecting every violation in a build script that aborts
/// on the first one anyway.
pub fn check_file(file: &FileDescriptorProto) -> Result<(), SchemaViolation> {
    for message in &file.message_type {
        check_message(message)?;
    }
    Ok(())
}

fn check_message(message: &DescriptorProto) -> Result<(), SchemaViolation> {
    let message_name = message.name().to_string();

    let reserved_names: Vec<&str> = message.reserved_name.iter().map(String::as_str).collect();
    let reserved_ranges: Vec<(i32, i32)> = message
        .reserved_range
        .iter()
        .map(|range| (range.start(), range.end()))
        .collect();
    // protoc synthesizes a nested, `map_entry`-flagged type for every `map<K, V>` field,
    // directly under the message that declares it; a field's `type_name` points at one of
    // these iff the field is a map.
    let map_entry_names: Vec<&str> = message
        .nested_type
        .iter()
        .filter(|nested| {
            nested
                .options
                .as_ref()
                .and_then(|options| options.map_entry)
                .unwrap_or(false)
        })
        .map(|nested| nested.name())
        .collect();

    let mut numbers: HashMap<i32, &str> = HashMap::new();

    for field in &message.field {
        check_field(
            &message_name,
            field,
            &reserved_names,
            &reserved_ranges,
            &map_entry_names,
            &mut numbers,
        )?;
    }

    for nested in &message.nested_type {
        // Map entry types are synthesized by protoc for every `map<K, V>` field; they're
        // rejected at the field site in `check_field`, not here, so skip them to avoid a
        // duplicate (and less specific) error.
        let is_map_entry = nested
            .options
            .as_ref()
            .and_then(|options| options.map_entry)
            .unwrap_or(false);
        if !is_map_entry {
            check_message(nested)?;
        }
    }

    Ok(())
}

fn check_field(
    message_name: &str,
    field: &FieldDescriptorProto,
    reserved_names: &[&str],
    reserved_ranges: &[(i32, i32)],
    map_entry_names: &[&str],
    numbers: &mut HashMap<i32, &str>,
) -> Result<(), SchemaViolation> {
    let field_name = field.name().to_string();

    if field.r#type() == Type::Group {
        return Err(SchemaViolation::GroupField {
            message: message_name.to_string(),
            field: field_name,
        });
    }

    if is_map_field(field, map_entry_names) {
        return Err(SchemaViolation::MapField {
            message: message_name.to_string(),
            field: field_name,
        });
    }

    if reserved_names.contains(&field.name()) {
        return Err(SchemaViolation::ReservedName {
            message: message_name.to_string(),
            field: field_name,
        });
    }

    let number = field.number();
    // `reserved 5 to 9;` reserves an inclusive range; protoc's `end` is exclusive, matching
    // Rust's `start..end` convention, so no off-by-one adjustment is needed here.
    if reserved_ranges.iter().any(|&(start, end)| number >= start && number < end) {
        return Err(SchemaViolation::ReservedNumber {
            message: message_name.to_string(),
            field: field_name,
            number,
        });
    }

    if let Some(first_field) = numbers.insert(number, field.name()) {
        return Err(SchemaViolation::DuplicateNumber {
            message: message_name.to_string(),
            first_field: first_field.to_string(),
            second_field: field_name,
            number,
        });
    }

    Ok(())
}

/// A field's type name points at a nested message flagged `map_entry` iff it's a `map<K, V>`
/// field; `protoc` synthesizes that nested type for every map field declared in the message.
fn is_map_field(field: &FieldDescriptorProto, map_entry_names: &[&str]) -> bool {
    field.r#type() == Type::Message
        && field.label() == prost_types::field_descriptor_proto::Label::Repeated
        && field
            .type_name
            .as_ref()
            .and_then(|name| name.rsplit('.').next())
            .map(|short_name| map_entry_names.contains(&short_name))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::field_descriptor_proto::Label;

    fn field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_string()),
            number: Some(number),
            r#type: Some(ty as i32),
            label: Some(Label::Optional as i32),
            ..Default::default()
        }
    }

    #[test]
    fn accepts_a_clean_message() {
        let message = DescriptorProto {
            name: Some("Point".to_string()),
            field: vec![field("x", 1, Type::Int32), field("y", 2, Type::Int32)],
            ..Default::default()
        };
        assert!(check_message(&message).is_ok());
    }

    #[test]
    fn rejects_group_fields() {
        let message = DescriptorProto {
            name: Some("Legacy".to_string()),
            field: vec![field("result", 1, Type::Group)],
            ..Default::default()
        };
        assert_eq!(
            check_message(&message),
            Err(SchemaViolation::GroupField {
                message: "Legacy".to_string(),
                field: "result".to_string(),
            })
        );
    }

    #[test]
    fn rejects_duplicate_field_numbers() {
        let message = DescriptorProto {
            name: Some("Dup".to_string()),
            field: vec![field("a", 1, Type::Int32), field("b", 1, Type::Int32)],
            ..Default::default()
        };
        assert_eq!(
            check_message(&message),
            Err(SchemaViolation::DuplicateNumber {
                message: "Dup".to_string(),
                first_field: "a".to_string(),
                second_field: "b".to_string(),
                number: 1,
            })
        );
    }

    #[test]
    fn rejects_reserved_numbers() {
        let message = DescriptorProto {
            name: Some("Reserved".to_string()),
            field: vec![field("a", 5, Type::Int32)],
            reserved_range: vec![prost_types::descriptor_proto::ReservedRange {
                start: Some(5),
                end: Some(10),
            }],
            ..Default::default()
        };
        assert_eq!(
            check_message(&message),
            Err(SchemaViolation::ReservedNumber {
                message: "Reserved".to_string(),
                field: "a".to_string(),
                number: 5,
            })
        );
    }

    #[test]
    fn rejects_map_fields() {
        let mut entry_field = field("values", 1, Type::Message);
        entry_field.type_name = Some(".pkg.Config.ValuesEntry".to_string());
        entry_field.label = Some(Label::Repeated as i32);

        let message = DescriptorProto {
            name: Some("Config".to_string()),
            field: vec![entry_field],
            nested_type: vec![DescriptorProto {
                name: Some("ValuesEntry".to_string()),
                options: Some(prost_types::MessageOptions {
                    map_entry: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            check_message(&message),
            Err(SchemaViolation::MapField {
                message: "Config".to_string(),
                field: "values".to_string(),
            })
        );
    }

    #[test]
    fn rejects_reserved_names() {
        let message = DescriptorProto {
            name: Some("Reserved".to_string()),
            field: vec![field("old_field", 1, Type::Int32)],
            reserved_name: vec!["old_field".to_string()],
            ..Default::default()
        };
        assert_eq!(
            check_message(&message),
            Err(SchemaViolation::ReservedName {
                message: "Reserved".to_string(),
                field: "old_field".to_string(),
            })
        );
    }
}
