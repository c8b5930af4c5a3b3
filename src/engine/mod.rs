//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! The engine module provides:
//! - `SyncEngine` - Drives one stream through its pages, or several streams
//!   through a bounded worker pool
//! - `SyncConfig` - Concurrency and page cap
//! - `Message` - SCHEMA and RECORD messages sent to the output sink
//!
//! Each stream walks `Start -> RequestPending -> Extracting -> Paginating`
//! and back to `RequestPending` until the API stops returning a `next` URL.
//! Records are sent downstream as soon as their page is extracted.

mod types;

pub use types::{Message, StreamOutcome, StreamStatus, SyncConfig, SyncReport, SyncStats};

use crate::config::TapConfig;
use crate::decode::{ConformToSchema, PostProcess, RecordExtractor};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestBuilder};
use crate::pagination::{Cursor, NextUrlPaginator, PaginationState, Paginator};
use crate::streams::ResourceDefinition;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Where a stream is in its read loop
enum Phase {
    Start,
    RequestPending(Option<Cursor>),
    Extracting(Value),
    Paginating(Value),
    Done,
}

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    client: HttpClient,
    base_url: String,
    config: TapConfig,
    sync_config: SyncConfig,
    paginator: NextUrlPaginator,
    post_process: Option<Arc<dyn PostProcess>>,
    cancel: CancellationToken,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, base_url: impl Into<String>, config: TapConfig) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            config,
            sync_config: SyncConfig::default(),
            paginator: NextUrlPaginator::default(),
            post_process: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_sync_config(mut self, sync_config: SyncConfig) -> Self {
        self.sync_config = sync_config;
        self
    }

    /// Run an extra processor on every record after schema conformance
    #[must_use]
    pub fn with_post_process(mut self, post_process: Arc<dyn PostProcess>) -> Self {
        self.post_process = Some(post_process);
        self
    }

    /// Share a cancellation token with the caller
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops every stream before its next page
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn sync_config(&self) -> &SyncConfig {
        &self.sync_config
    }

    /// Sync a single stream, sending its messages to `tx`
    pub async fn sync_stream(
        &self,
        resource: &ResourceDefinition,
        tx: &mpsc::Sender<Message>,
    ) -> Result<SyncStats> {
        let mut stats = SyncStats::default();
        self.drive(resource, tx, &mut stats).await?;
        Ok(stats)
    }

    /// Sync several streams through a bounded worker pool.
    ///
    /// Outcomes come back in the order of `resources`. An auth failure on
    /// any stream cancels the rest of the run.
    pub async fn sync_all(
        &self,
        resources: &[&ResourceDefinition],
        tx: mpsc::Sender<Message>,
    ) -> SyncReport {
        let start = Instant::now();
        let concurrency = self.sync_config.concurrency.max(1);

        info!(streams = resources.len(), concurrency, "Starting sync");

        let tx = &tx;
        let outcomes: Vec<StreamOutcome> = stream::iter(resources.iter().copied())
            .map(|resource| self.run_stream(resource, tx))
            .buffered(concurrency)
            .collect()
            .await;

        let report = SyncReport {
            outcomes,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            records = report.total_records(),
            failed = report.failed_streams().len(),
            duration_ms = report.duration_ms,
            "Sync finished"
        );

        report
    }

    async fn run_stream(
        &self,
        resource: &ResourceDefinition,
        tx: &mpsc::Sender<Message>,
    ) -> StreamOutcome {
        let start = Instant::now();
        let mut stats = SyncStats::default();

        let result = self.drive(resource, tx, &mut stats).await;

        match &result {
            Ok(()) => info!(
                stream = resource.name,
                records = stats.records,
                pages = stats.pages,
                skipped = stats.skipped,
                "Stream completed"
            ),
            Err(e) if e.is_cancelled() => info!(stream = resource.name, "Stream cancelled"),
            Err(e) if e.is_auth_failure() => {
                error!(stream = resource.name, error = %e, "Authentication failed, aborting sync");
                self.cancel.cancel();
            }
            Err(e) => error!(stream = resource.name, error = %e, "Stream failed"),
        }

        StreamOutcome::finished(
            resource.name,
            stats,
            start.elapsed().as_millis() as u64,
            &result,
        )
    }

    async fn drive(
        &self,
        resource: &ResourceDefinition,
        tx: &mpsc::Sender<Message>,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let builder = RequestBuilder::new(&self.base_url, &self.config);
        let extractor = RecordExtractor::new(resource.records_path)?;
        let conform = ConformToSchema::new(resource.name, resource.schema, resource.primary_key);
        let mut pagination = PaginationState::new();
        let mut phase = Phase::Start;

        loop {
            phase = match phase {
                Phase::Start => {
                    self.ensure_active(resource)?;
                    info!(stream = resource.name, "Starting stream");
                    let schema = resource.json_schema().to_json();
                    self.send(tx, Message::schema(resource.name, schema, resource.primary_key))
                        .await?;
                    Phase::RequestPending(None)
                }
                Phase::RequestPending(cursor) => {
                    self.ensure_active(resource)?;
                    if let Some(max_pages) = self.sync_config.max_pages {
                        if pagination.pages >= max_pages {
                            return Err(Error::PageLimitExceeded {
                                stream: resource.name.to_string(),
                                max_pages,
                            });
                        }
                    }

                    let request = builder.build(resource, cursor.as_ref());
                    debug!(
                        stream = resource.name,
                        page = pagination.pages + 1,
                        url = %request.url,
                        "Requesting page"
                    );

                    let body = tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => {
                            return Err(Error::Cancelled { stream: resource.name.to_string() });
                        }
                        body = self.client.fetch_json(&request) => body?,
                    };
                    stats.pages += 1;
                    Phase::Extracting(body)
                }
                Phase::Extracting(body) => {
                    let records = extractor.extract(&body)?;
                    let count = records.len();
                    let time_extracted = Utc::now();

                    for record in records {
                        match self.process(&conform, record) {
                            Some(record) => {
                                self.send(tx, Message::record(resource.name, record, time_extracted))
                                    .await?;
                                stats.records += 1;
                            }
                            None => stats.skipped += 1,
                        }
                    }

                    pagination.add_page();
                    debug!(
                        stream = resource.name,
                        page = pagination.pages,
                        records = count,
                        "Extracted page"
                    );
                    Phase::Paginating(body)
                }
                Phase::Paginating(body) => {
                    let next = self.paginator.next_cursor(&body)?;
                    pagination.advance(next);
                    if pagination.done {
                        Phase::Done
                    } else {
                        Phase::RequestPending(pagination.cursor.clone())
                    }
                }
                Phase::Done => return Ok(()),
            };
        }
    }

    fn process(&self, conform: &ConformToSchema, record: Value) -> Option<Value> {
        let record = conform.process(record)?;
        match &self.post_process {
            Some(post_process) => post_process.process(record),
            None => Some(record),
        }
    }

    fn ensure_active(&self, resource: &ResourceDefinition) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled {
                stream: resource.name.to_string(),
            });
        }
        Ok(())
    }

    async fn send(&self, tx: &mpsc::Sender<Message>, message: Message) -> Result<()> {
        tx.send(message)
            .await
            .map_err(|_| Error::output("message channel closed"))
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .field("sync_config", &self.sync_config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
