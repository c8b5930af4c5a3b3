//! Per-record post-processing
//!
//! Runs on every extracted record before it is emitted. A processor may
//! rewrite the record or return `None` to skip it; either way only that
//! record is affected.

use crate::schema::{self, Field};
use serde_json::Value;
use tracing::warn;

/// Transform or drop a single record
pub trait PostProcess: Send + Sync {
    /// Return the record to emit, or `None` to skip it
    fn process(&self, record: Value) -> Option<Value>;
}

/// Passes records through untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl PostProcess for Identity {
    fn process(&self, record: Value) -> Option<Value> {
        Some(record)
    }
}

impl<F> PostProcess for F
where
    F: Fn(Value) -> Option<Value> + Send + Sync,
{
    fn process(&self, record: Value) -> Option<Value> {
        self(record)
    }
}

/// Shapes records to a stream schema.
///
/// Undeclared properties are dropped. Records that are not objects, or that
/// lack a non-null value for a primary key field, are skipped with a warning.
#[derive(Debug, Clone, Copy)]
pub struct ConformToSchema {
    stream: &'static str,
    fields: &'static [Field],
    primary_key: &'static [&'static str],
}

impl ConformToSchema {
    pub fn new(
        stream: &'static str,
        fields: &'static [Field],
        primary_key: &'static [&'static str],
    ) -> Self {
        Self {
            stream,
            fields,
            primary_key,
        }
    }
}

impl PostProcess for ConformToSchema {
    fn process(&self, mut record: Value) -> Option<Value> {
        let Some(obj) = record.as_object_mut() else {
            warn!(stream = self.stream, "skipping non-object record");
            return None;
        };

        if let Some(key) = self
            .primary_key
            .iter()
            .find(|key| obj.get(**key).map_or(true, Value::is_null))
        {
            warn!(
                stream = self.stream,
                key = *key,
                "skipping record without primary key"
            );
            return None;
        }

        schema::conform(self.fields, obj);
        Some(record)
    }
}
