//! Record extraction from parsed response bodies

use crate::error::{Error, Result};
use serde_json::Value;

/// Parse a response body as JSON
pub fn parse_body(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
}

/// Pulls the record array out of a response body
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    /// JSONPath to extract records
    records_path: String,
    /// Top-level key that must hold an array, for `$.key[*]` paths
    container: Option<String>,
}

impl RecordExtractor {
    /// Create an extractor for a JSONPath such as `$.answers[*]`
    pub fn new(records_path: impl Into<String>) -> Result<Self> {
        let records_path = records_path.into();
        // surfaces syntax errors at construction
        find(&records_path, &Value::Null)?;

        let container = records_path
            .strip_prefix("$.")
            .and_then(|rest| rest.strip_suffix("[*]"))
            .filter(|key| !key.contains(['.', '[']))
            .map(ToString::to_string);

        Ok(Self {
            records_path,
            container,
        })
    }

    /// The JSONPath this extractor reads
    pub fn records_path(&self) -> &str {
        &self.records_path
    }

    /// Extract records in response order.
    ///
    /// An empty array yields no records. For `$.key[*]` paths a missing or
    /// non-array `key` means the response is malformed.
    pub fn extract(&self, body: &Value) -> Result<Vec<Value>> {
        if let Some(key) = &self.container {
            match body.get(key) {
                Some(Value::Array(_)) => {}
                Some(other) => {
                    return Err(Error::RecordExtraction {
                        path: self.records_path.clone(),
                        message: format!("expected an array at '{key}', found {}", kind(other)),
                    })
                }
                None => {
                    return Err(Error::RecordExtraction {
                        path: self.records_path.clone(),
                        message: format!("response has no '{key}' field"),
                    })
                }
            }
        }

        match find(&self.records_path, body)? {
            Value::Array(arr) => Ok(arr),
            Value::Null => Ok(vec![]),
            other => Ok(vec![other]),
        }
    }
}

fn find(path: &str, body: &Value) -> Result<Value> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;
    Ok(jp.find(body))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
