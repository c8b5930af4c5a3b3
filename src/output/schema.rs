//! Arrow schema derivation and JSON to Arrow conversion
//!
//! Column types come from the declared field tables, never from the data,
//! so every Parquet file of a stream has the same layout no matter which
//! fields a page happened to carry.

use crate::error::{Error, Result};
use crate::schema::{self, FieldType};
use arrow::datatypes::{DataType, Field, Fields, Schema, SchemaRef, TimeUnit};
use arrow::json::ReaderBuilder;
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use serde_json::Value;
use std::sync::Arc;

/// Arrow schema for a stream's declared fields. Every column is nullable.
pub fn arrow_schema(fields: &[schema::Field]) -> Schema {
    Schema::new(arrow_fields(fields))
}

fn arrow_fields(fields: &[schema::Field]) -> Fields {
    fields
        .iter()
        .map(|f| Field::new(f.name, arrow_type(&f.field_type), true))
        .collect()
}

/// Offset-based zone; named zones need arrow's `chrono-tz` feature
const UTC_OFFSET: &str = "+00:00";

/// Arrow type for a declared field type.
///
/// Open objects have no fixed set of keys and are stored as JSON text.
pub fn arrow_type(field_type: &FieldType) -> DataType {
    match field_type {
        FieldType::Integer => DataType::Int64,
        FieldType::String => DataType::Utf8,
        FieldType::Boolean => DataType::Boolean,
        FieldType::DateTime => DataType::Timestamp(TimeUnit::Microsecond, Some(UTC_OFFSET.into())),
        FieldType::Object {
            additional: true, ..
        } => DataType::Utf8,
        FieldType::Object { fields, .. } if fields.is_empty() => DataType::Utf8,
        FieldType::Object { fields, .. } => DataType::Struct(arrow_fields(fields)),
        FieldType::Array(item) => {
            DataType::List(Arc::new(Field::new("item", arrow_type(item), true)))
        }
    }
}

/// Rewrite a record so it decodes against [`arrow_schema`].
///
/// The API does not always honor the declared types, and the JSON output
/// passes such values through untouched. Here every value is coerced to its
/// column: string columns take any value (scalars as text, composites as
/// JSON text), other columns get null when the value cannot be represented.
pub fn prepare_record(fields: &[schema::Field], record: &Value) -> Value {
    let Value::Object(obj) = record else {
        return record.clone();
    };

    let mut out = serde_json::Map::with_capacity(obj.len());
    for (key, value) in obj {
        let prepared = match schema::find_field(fields, key) {
            Some(field) => prepare_value(&field.field_type, value),
            None => value.clone(),
        };
        out.insert(key.clone(), prepared);
    }
    Value::Object(out)
}

fn prepare_value(field_type: &FieldType, value: &Value) -> Value {
    if value.is_null() {
        return Value::Null;
    }
    match field_type {
        FieldType::Object { .. } if arrow_type(field_type) == DataType::Utf8 => {
            Value::String(value.to_string())
        }
        FieldType::Object { fields, .. } => match value {
            Value::Object(_) => prepare_record(fields, value),
            _ => Value::Null,
        },
        FieldType::Array(item) => match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| prepare_value(item, v)).collect()),
            _ => Value::Null,
        },
        FieldType::String => match value {
            Value::String(_) => value.clone(),
            other => Value::String(other.to_string()),
        },
        FieldType::Integer => match value {
            Value::Number(n) if n.is_i64() => value.clone(),
            Value::String(s) => s.trim().parse::<i64>().map_or(Value::Null, Value::from),
            _ => Value::Null,
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => value.clone(),
            Value::String(s) => s.parse::<bool>().map_or(Value::Null, Value::Bool),
            _ => Value::Null,
        },
        FieldType::DateTime => match value {
            Value::String(s) if DateTime::parse_from_rfc3339(s).is_ok() => value.clone(),
            _ => Value::Null,
        },
    }
}

/// Convert prepared JSON records to a RecordBatch with the given schema
pub fn json_to_arrow(schema: &SchemaRef, records: &[Value]) -> Result<RecordBatch> {
    if records.is_empty() {
        return Ok(RecordBatch::new_empty(schema.clone()));
    }

    let mut decoder = ReaderBuilder::new(schema.clone())
        .with_strict_mode(false)
        .build_decoder()?;
    decoder.serialize(records)?;

    decoder
        .flush()?
        .ok_or_else(|| Error::output("decoder produced no batch"))
}
