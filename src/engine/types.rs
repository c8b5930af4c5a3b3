//! Engine types
//!
//! Message types, configuration and per-stream outcomes for the sync engine.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// A message emitted during sync.
///
/// Serializes to the Singer wire shape, e.g.
/// `{"type":"RECORD","stream":"surveys","record":{..},"time_extracted":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// Stream schema, sent once before the stream's records
    Schema {
        /// Stream name
        stream: String,
        /// JSON Schema of the records
        schema: Value,
        /// Primary key fields
        key_properties: Vec<String>,
    },
    /// A single record
    Record {
        /// Stream name
        stream: String,
        /// The record, already shaped to the schema
        record: Value,
        /// When the page holding the record was received
        time_extracted: DateTime<Utc>,
    },
}

impl Message {
    /// Create a schema message
    pub fn schema(stream: impl Into<String>, schema: Value, key_properties: &[&str]) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties: key_properties.iter().map(ToString::to_string).collect(),
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: Value, time_extracted: DateTime<Utc>) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Stream this message belongs to
    pub fn stream(&self) -> &str {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => stream,
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Serialize to a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Configuration for sync operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Streams synced at the same time
    pub concurrency: usize,
    /// Page cap per stream; `None` follows `next` until exhausted
    pub max_pages: Option<u32>,
    /// Messages buffered between the engine and the output sink
    pub channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_pages: None,
            channel_capacity: 1024,
        }
    }
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set concurrency, at least 1
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the page cap
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Counters for one stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records emitted
    pub records: u64,
    /// Pages fetched
    pub pages: u32,
    /// Records skipped by post-processing
    pub skipped: u64,
}

/// How a stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Succeeded,
    Failed,
    Cancelled,
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Result of syncing one stream
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub stream: String,
    pub status: StreamStatus,
    pub stats: SyncStats,
    pub duration_ms: u64,
    /// Error message for failed or cancelled streams
    pub error: Option<String>,
}

impl StreamOutcome {
    pub(crate) fn finished(
        stream: &str,
        stats: SyncStats,
        duration_ms: u64,
        result: &Result<()>,
    ) -> Self {
        let (status, error) = match result {
            Ok(()) => (StreamStatus::Succeeded, None),
            Err(e) if e.is_cancelled() => (StreamStatus::Cancelled, Some(e.to_string())),
            Err(e) => (StreamStatus::Failed, Some(e.to_string())),
        };

        Self {
            stream: stream.to_string(),
            status,
            stats,
            duration_ms,
            error,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == StreamStatus::Succeeded
    }
}

/// Outcomes of a whole run, in stream order
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub outcomes: Vec<StreamOutcome>,
    pub duration_ms: u64,
}

impl SyncReport {
    /// True when every stream succeeded
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(StreamOutcome::is_success)
    }

    /// Names of streams that did not succeed
    pub fn failed_streams(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.stream.clone())
            .collect()
    }

    /// Records emitted across all streams
    pub fn total_records(&self) -> u64 {
        self.outcomes.iter().map(|o| o.stats.records).sum()
    }

    /// Outcome for a stream
    pub fn outcome(&self, stream: &str) -> Option<&StreamOutcome> {
        self.outcomes.iter().find(|o| o.stream == stream)
    }

    /// `Err(SyncFailed)` naming every stream that did not succeed
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Error::SyncFailed {
                streams: self.failed_streams(),
            })
        }
    }

    /// Fixed-width status table, one row per stream
    pub fn summary_table(&self) -> String {
        let mut out = format!(
            "{:<12} {:<10} {:>10} {:>6} {:>8} {:>10}\n",
            "STREAM", "STATUS", "RECORDS", "PAGES", "SKIPPED", "MS"
        );
        for o in &self.outcomes {
            out.push_str(&format!(
                "{:<12} {:<10} {:>10} {:>6} {:>8} {:>10}\n",
                o.stream,
                o.status.to_string(),
                o.stats.records,
                o.stats.pages,
                o.stats.skipped,
                o.duration_ms
            ));
        }
        out
    }
}
