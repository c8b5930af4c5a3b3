//! Resource definitions
//!
//! One immutable [`ResourceDefinition`] per Simplesat resource. The sync
//! engine is generic over these records; nothing else differs between
//! streams.

mod schemas;

use crate::error::{Error, Result};
use crate::schema::{self, find_field, Field, JsonSchema};
use crate::types::Method;
use std::collections::HashMap;
use std::sync::LazyLock;

pub use schemas::{ANSWER_FIELDS, QUESTION_FIELDS, RESPONSE_FIELDS, SURVEY_FIELDS};

/// Everything the engine needs to sync one resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDefinition {
    /// Stream name, also the key of the record array in responses
    pub name: &'static str,
    /// Path appended to the base URL
    pub path: &'static str,
    pub method: Method,
    /// JSONPath locating records in a response body
    pub records_path: &'static str,
    pub primary_key: &'static [&'static str],
    pub schema: &'static [Field],
}

pub const ANSWERS: ResourceDefinition = ResourceDefinition {
    name: "answers",
    path: "/answers/search",
    method: Method::POST,
    records_path: "$.answers[*]",
    primary_key: &["id"],
    schema: ANSWER_FIELDS,
};

pub const QUESTIONS: ResourceDefinition = ResourceDefinition {
    name: "questions",
    path: "/questions",
    method: Method::GET,
    records_path: "$.questions[*]",
    primary_key: &["id"],
    schema: QUESTION_FIELDS,
};

pub const RESPONSES: ResourceDefinition = ResourceDefinition {
    name: "responses",
    path: "/responses/search",
    method: Method::POST,
    records_path: "$.responses[*]",
    primary_key: &["id"],
    schema: RESPONSE_FIELDS,
};

pub const SURVEYS: ResourceDefinition = ResourceDefinition {
    name: "surveys",
    path: "/surveys",
    method: Method::GET,
    records_path: "$.surveys[*]",
    primary_key: &["id"],
    schema: SURVEY_FIELDS,
};

/// All resources in discovery order
pub static RESOURCES: [ResourceDefinition; 4] = [ANSWERS, QUESTIONS, RESPONSES, SURVEYS];

static BY_NAME: LazyLock<HashMap<&'static str, &'static ResourceDefinition>> =
    LazyLock::new(|| RESOURCES.iter().map(|r| (r.name, r)).collect());

/// All resource definitions
pub fn all() -> &'static [ResourceDefinition] {
    &RESOURCES
}

/// Look up a resource by stream name
pub fn find(name: &str) -> Option<&'static ResourceDefinition> {
    BY_NAME.get(name).copied()
}

/// Resolve a list of stream names, rejecting unknown ones.
///
/// The result follows discovery order regardless of the order given.
pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Vec<&'static ResourceDefinition>> {
    for name in names {
        if find(name.as_ref()).is_none() {
            return Err(Error::StreamNotFound {
                stream: name.as_ref().to_string(),
            });
        }
    }

    Ok(RESOURCES
        .iter()
        .filter(|r| names.iter().any(|n| n.as_ref() == r.name))
        .collect())
}

/// Validate every resource definition
pub fn validate_all() -> Result<()> {
    RESOURCES.iter().try_for_each(ResourceDefinition::validate)
}

impl ResourceDefinition {
    /// JSON Schema of the records in this stream
    pub fn json_schema(&self) -> JsonSchema {
        schema::to_json_schema(self.schema)
    }

    /// Check the schema table and that every primary key is a declared,
    /// required scalar field
    pub fn validate(&self) -> Result<()> {
        schema::validate_fields(self.name, self.schema)?;

        if self.primary_key.is_empty() {
            return Err(Error::schema(self.name, "no primary key declared"));
        }

        for key in self.primary_key {
            let field = find_field(self.schema, key).ok_or_else(|| {
                Error::schema(self.name, format!("primary key '{key}' is not declared"))
            })?;
            if !field.field_type.is_scalar() {
                return Err(Error::schema(
                    self.name,
                    format!("primary key '{key}' must be a scalar"),
                ));
            }
            if !field.required {
                return Err(Error::schema(
                    self.name,
                    format!("primary key '{key}' must be required"),
                ));
            }
        }

        if !self.records_path.starts_with("$.") {
            return Err(Error::schema(
                self.name,
                format!("records path '{}' must start with '$.'", self.records_path),
            ));
        }

        Ok(())
    }

    /// Primary key as owned strings
    pub fn key_properties(&self) -> Vec<String> {
        self.primary_key.iter().map(ToString::to_string).collect()
    }
}
