//! Declarative field tables
//!
//! Stream schemas are plain `const` data: a slice of [`Field`]s, each with a
//! [`FieldType`] that may nest further field slices. Tables are checked once
//! at startup and then used to publish JSON Schema, build Arrow schemas and
//! strip undeclared properties from records.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::error::{Error, Result};
use crate::types::JsonObject;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Type of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    String,
    Boolean,
    /// RFC 3339 timestamp carried as a string
    DateTime,
    Object {
        fields: &'static [Field],
        /// Whether properties beyond `fields` are kept
        additional: bool,
    },
    Array(&'static FieldType),
}

impl FieldType {
    /// Whether values of this type are JSON scalars
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            FieldType::Integer | FieldType::String | FieldType::Boolean | FieldType::DateTime
        )
    }

    /// Render as a JSON Schema property
    pub fn to_property(&self) -> SchemaProperty {
        match self {
            FieldType::Integer => SchemaProperty::new(JsonType::Integer),
            FieldType::String => SchemaProperty::new(JsonType::String),
            FieldType::Boolean => SchemaProperty::new(JsonType::Boolean),
            FieldType::DateTime => SchemaProperty::new(JsonType::String).with_format("date-time"),
            FieldType::Object { fields, additional } => {
                SchemaProperty::object(properties(fields), *additional)
            }
            FieldType::Array(item) => SchemaProperty::array(item.to_property().nullable()),
        }
    }
}

/// A named, typed field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
}

impl Field {
    /// Create an optional field
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub const fn datetime(name: &'static str) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    /// Object field that only keeps its declared properties
    pub const fn object(name: &'static str, fields: &'static [Field]) -> Self {
        Self::new(
            name,
            FieldType::Object {
                fields,
                additional: false,
            },
        )
    }

    /// Object field that keeps undeclared properties too
    pub const fn open_object(name: &'static str, fields: &'static [Field]) -> Self {
        Self::new(
            name,
            FieldType::Object {
                fields,
                additional: true,
            },
        )
    }

    pub const fn array(name: &'static str, item: &'static FieldType) -> Self {
        Self::new(name, FieldType::Array(item))
    }

    /// Mark the field as required (non-null)
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }
}

fn properties(fields: &[Field]) -> BTreeMap<String, SchemaProperty> {
    fields
        .iter()
        .map(|field| {
            let prop = field.field_type.to_property();
            let prop = if field.required { prop } else { prop.nullable() };
            (field.name.to_string(), prop)
        })
        .collect()
}

/// Render a field table as a top-level JSON Schema
pub fn to_json_schema(fields: &[Field]) -> JsonSchema {
    let mut schema = JsonSchema::new();
    schema.properties = properties(fields);
    for field in fields.iter().filter(|f| f.required) {
        schema.add_required(field.name);
    }
    schema
}

/// Look up a top-level field by name
pub fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

/// Check a field table for structural mistakes
pub fn validate_fields(stream: &str, fields: &[Field]) -> Result<()> {
    validate_level(stream, "", fields)
}

fn validate_level(stream: &str, prefix: &str, fields: &[Field]) -> Result<()> {
    if fields.is_empty() {
        let at = if prefix.is_empty() { "root" } else { prefix };
        return Err(Error::schema(stream, format!("no fields declared at {at}")));
    }

    let mut seen = HashSet::new();
    for field in fields {
        let path = if prefix.is_empty() {
            field.name.to_string()
        } else {
            format!("{prefix}.{}", field.name)
        };

        if field.name.is_empty() {
            return Err(Error::schema(stream, format!("empty field name under {prefix}")));
        }
        if !seen.insert(field.name) {
            return Err(Error::schema(stream, format!("duplicate field '{path}'")));
        }

        validate_type(stream, &path, &field.field_type)?;
    }
    Ok(())
}

fn validate_type(stream: &str, path: &str, field_type: &FieldType) -> Result<()> {
    match field_type {
        FieldType::Object { fields, .. } => validate_level(stream, path, fields),
        FieldType::Array(item) => validate_type(stream, &format!("{path}[]"), item),
        _ => Ok(()),
    }
}

/// Drop properties not declared in `fields`, recursing into nested objects
/// and arrays of objects. Returns the number of properties removed.
pub fn conform(fields: &[Field], record: &mut JsonObject) -> usize {
    let before = record.len();
    record.retain(|key, _| find_field(fields, key).is_some());
    let mut dropped = before - record.len();

    for field in fields {
        if let Some(value) = record.get_mut(field.name) {
            dropped += conform_value(&field.field_type, value);
        }
    }
    dropped
}

fn conform_value(field_type: &FieldType, value: &mut Value) -> usize {
    match (field_type, value) {
        (FieldType::Object { fields, additional }, Value::Object(obj)) => {
            if *additional {
                0
            } else {
                conform(fields, obj)
            }
        }
        (FieldType::Array(item), Value::Array(items)) => items
            .iter_mut()
            .map(|element| conform_value(item, element))
            .sum(),
        _ => 0,
    }
}
