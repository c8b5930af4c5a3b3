//! The Simplesat tap
//!
//! Ties configuration, the resource table and the sync engine together
//! behind the four tap operations: `spec`, `check`, `discover` and `read`.

use crate::config::TapConfig;
use crate::decode::RecordExtractor;
use crate::engine::{Message, SyncConfig, SyncEngine, SyncReport};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestBuilder, DEFAULT_BASE_URL};
use crate::streams::{self, ResourceDefinition, SURVEYS};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// `SUCCEEDED` or `FAILED`
    pub fn status(&self) -> &'static str {
        if self.success {
            "SUCCEEDED"
        } else {
            "FAILED"
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// One stream in a discovered catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub stream: String,
    pub tap_stream_id: String,
    pub schema: Value,
    pub key_properties: Vec<String>,
    pub metadata: Vec<Value>,
}

impl CatalogEntry {
    fn from_resource(resource: &ResourceDefinition) -> Self {
        let key_properties = resource.key_properties();
        let metadata = vec![json!({
            "breadcrumb": [],
            "metadata": {
                "inclusion": "available",
                "selected": true,
                "table-key-properties": key_properties,
                "forced-replication-method": "FULL_TABLE"
            }
        })];

        Self {
            stream: resource.name.to_string(),
            tap_stream_id: resource.name.to_string(),
            schema: resource.json_schema().to_json(),
            key_properties,
            metadata,
        }
    }
}

/// Streams offered by the tap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub streams: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|s| s.stream == stream)
    }
}

// ============================================================================
// Read Options
// ============================================================================

/// Options for a `read` run
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Streams to sync; empty means all
    pub streams: Vec<String>,
    /// Streams synced at the same time
    pub concurrency: Option<usize>,
    /// Page cap, overriding the configured one
    pub max_pages: Option<u32>,
    /// Token that stops the run before the next page
    pub cancel: Option<CancellationToken>,
}

// ============================================================================
// Tap
// ============================================================================

/// Simplesat tap
#[derive(Debug, Clone)]
pub struct Tap {
    config: TapConfig,
    base_url: String,
    http: HttpClientConfig,
}

impl Tap {
    /// Create a tap after validating the config and the resource table
    pub fn new(config: TapConfig) -> Result<Self> {
        config.validate()?;
        streams::validate_all()?;

        Ok(Self {
            config,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: HttpClientConfig::default(),
        })
    }

    /// Point the tap at another API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override HTTP client settings
    #[must_use]
    pub fn with_http_config(mut self, http: HttpClientConfig) -> Self {
        self.http = http;
        self
    }

    pub fn config(&self) -> &TapConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Configuration JSON Schema
    pub fn spec() -> Value {
        json!({
            "documentationUrl": "https://api.simplesat.io",
            "connectionSpecification": TapConfig::json_schema()
        })
    }

    /// Stream names in discovery order
    pub fn stream_names() -> Vec<&'static str> {
        streams::all().iter().map(|r| r.name).collect()
    }

    /// Catalog of every stream
    pub fn discover() -> Catalog {
        Catalog {
            streams: streams::all()
                .iter()
                .map(CatalogEntry::from_resource)
                .collect(),
        }
    }

    /// Fetch the first page of surveys and check its shape
    pub async fn check(&self) -> CheckResult {
        match self.check_connection().await {
            Ok(count) => {
                info!(records = count, "Connection check succeeded");
                CheckResult::success()
            }
            Err(e) => CheckResult::failure(format!("Connection failed: {e}")),
        }
    }

    async fn check_connection(&self) -> Result<usize> {
        let client = HttpClient::with_config(self.http.clone())?;
        let request = RequestBuilder::new(&self.base_url, &self.config).build(&SURVEYS, None);
        let body = client.fetch_json(&request).await?;
        let records = RecordExtractor::new(SURVEYS.records_path)?.extract(&body)?;
        Ok(records.len())
    }

    /// Build a sync engine sharing this tap's settings
    pub fn engine(&self, sync_config: SyncConfig) -> Result<SyncEngine> {
        let client = HttpClient::with_config(self.http.clone())?;
        Ok(SyncEngine::new(client, self.base_url.clone(), self.config.clone())
            .with_sync_config(sync_config))
    }

    /// Sync settings for a `read` run: the option's page cap wins over the
    /// configured one
    pub fn sync_config(&self, options: &ReadOptions) -> Result<SyncConfig> {
        let max_pages = options.max_pages.or(self.config.max_pages);
        if max_pages == Some(0) {
            return Err(Error::invalid_value("max_pages", "must be greater than zero"));
        }

        let mut sync_config = SyncConfig::new().with_max_pages(max_pages);
        if let Some(concurrency) = options.concurrency {
            sync_config = sync_config.with_concurrency(concurrency);
        }
        Ok(sync_config)
    }

    /// Sync the selected streams, sending messages to `tx`.
    ///
    /// Returns the per-stream report even when streams failed; callers turn
    /// it into an error with [`SyncReport::into_result`].
    pub async fn read(&self, options: ReadOptions, tx: mpsc::Sender<Message>) -> Result<SyncReport> {
        let resources = if options.streams.is_empty() {
            streams::all().iter().collect()
        } else {
            streams::select(&options.streams)?
        };

        let mut engine = self.engine(self.sync_config(&options)?)?;
        if let Some(cancel) = options.cancel {
            engine = engine.with_cancellation(cancel);
        }

        Ok(engine.sync_all(&resources, tx).await)
    }
}
