//! Pagination strategy implementations

use super::types::{Cursor, Paginator};
use crate::error::Result;
use serde_json::Value;

// ============================================================================
// Next URL Pagination
// ============================================================================

/// Next URL pagination (URL in response body)
///
/// Reads a top-level field holding the URL of the next page:
/// `{ "next": "https://api.simplesat.io/api/v1/surveys?page=2" }`.
/// A missing, null or empty field ends pagination. No cycle detection is
/// done; a server that always returns `next` is followed until the engine's
/// page cap, if any.
#[derive(Debug, Clone)]
pub struct NextUrlPaginator {
    /// Top-level field holding the next URL
    pub field: String,
}

impl Default for NextUrlPaginator {
    fn default() -> Self {
        Self::new("next")
    }
}

impl NextUrlPaginator {
    /// Create a new next URL paginator
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Paginator for NextUrlPaginator {
    fn next_cursor(&self, body: &Value) -> Result<Option<Cursor>> {
        match body.get(&self.field) {
            Some(Value::String(next)) if !next.is_empty() => Cursor::parse(next).map(Some),
            _ => Ok(None),
        }
    }
}
