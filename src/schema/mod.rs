//! Schema module
//!
//! Static stream schemas and their JSON Schema rendering.
//!
//! # Features
//!
//! - **Field Tables**: schemas declared as `const` data, no builder API
//! - **Startup Validation**: duplicate or empty declarations are rejected once
//! - **JSON Schema Output**: nullable types for optional fields, `required` for keys
//! - **Record Conforming**: undeclared properties are dropped before emission

mod fields;
mod types;

pub use fields::{conform, find_field, to_json_schema, validate_fields, Field, FieldType};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};

#[cfg(test)]
mod tests;
