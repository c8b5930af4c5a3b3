//! Pagination types and traits
//!
//! Defines the cursor value passed between pages and the paginator seam.

use crate::error::{Error, Result};
use serde_json::Value;
use url::{ParseError, Url};

/// Resolves relative `next` values; only the query survives, so the host
/// never matters.
const RELATIVE_BASE: &str = "http://localhost/";

/// Opaque pointer to the next page.
///
/// The API hands back a URL, absolute or relative (`?cursor=..`,
/// `/api/v1/answers/search?cursor=..`); only its query-string pairs are
/// reused when building the next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    raw: String,
    url: Url,
}

impl Cursor {
    /// Parse a cursor from the raw `next` value
    pub fn parse(raw: &str) -> Result<Self> {
        let url = match Url::parse(raw) {
            Err(ParseError::RelativeUrlWithoutBase) => {
                Url::parse(RELATIVE_BASE).and_then(|base| base.join(raw))
            }
            parsed => parsed,
        }
        .map_err(|e| Error::InvalidCursor {
            value: raw.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// Query-string pairs in the order they appear
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// The `next` value as the API sent it
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Tracks pagination progress for one stream
#[derive(Debug, Clone, Default)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages: u32,
    /// Cursor for the next request, if any
    pub cursor: Option<Cursor>,
    /// Is pagination complete?
    pub done: bool,
}

impl PaginationState {
    /// Create a new pagination state
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fetched page
    pub fn add_page(&mut self) {
        self.pages += 1;
    }

    /// Move to the next cursor, or finish when there is none
    pub fn advance(&mut self, cursor: Option<Cursor>) {
        self.done = cursor.is_none();
        self.cursor = cursor;
    }
}

/// Core trait for pagination strategies
pub trait Paginator: Send + Sync {
    /// Extract the cursor for the next page from a parsed response body.
    ///
    /// `Ok(None)` ends pagination.
    fn next_cursor(&self, body: &Value) -> Result<Option<Cursor>>;
}
