//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::output::{spawn_sink, FanOut, JsonLinesSink, ParquetSink, ParquetWriterConfig};
use crate::tap::{ReadOptions, Tap};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
    base_url: Option<String>,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            base_url: None,
        }
    }

    /// Send requests to another API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Spec => self.spec(),
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Read {
                streams,
                concurrency,
                max_pages,
            } => {
                let options = ReadOptions {
                    streams: streams.clone(),
                    concurrency: Some(*concurrency),
                    max_pages: *max_pages,
                    cancel: None,
                };
                self.read(options).await
            }
            Commands::Streams => self.streams(),
        }
    }

    /// Load config from `--config-json` or `--config`
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            return TapConfig::from_json_str(json);
        }
        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config(
                "No configuration provided (use --config or --config-json)",
            )),
        }
    }

    fn build_tap(&self) -> Result<Tap> {
        let tap = Tap::new(self.load_config()?)?;
        Ok(match &self.base_url {
            Some(base_url) => tap.with_base_url(base_url.clone()),
            None => tap,
        })
    }

    /// Show configuration specification
    fn spec(&self) -> Result<()> {
        output_message(&json!({
            "type": "SPEC",
            "spec": Tap::spec()
        }));
        Ok(())
    }

    /// Check the connection
    async fn check(&self) -> Result<()> {
        let tap = self.build_tap()?;
        info!(base_url = tap.base_url(), "Checking connection");

        let result = tap.check().await;
        output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": {
                "status": result.status(),
                "message": result.message.as_deref().unwrap_or("Connection successful")
            }
        }));

        Ok(())
    }

    /// Print the catalog
    fn discover(&self) -> Result<()> {
        let catalog = serde_json::to_value(Tap::discover())?;
        output_message(&catalog);
        Ok(())
    }

    /// List stream names
    fn streams(&self) -> Result<()> {
        output_message(&json!({
            "type": "STREAMS",
            "streams": Tap::stream_names()
        }));
        Ok(())
    }

    /// Sync streams to stdout, and to Parquet files when asked
    async fn read(&self, mut options: ReadOptions) -> Result<()> {
        let tap = self.build_tap()?;

        let mut sink = FanOut::new().with(Box::new(JsonLinesSink::stdout()));
        if self.cli.format == OutputFormat::Parquet {
            let dir = self
                .cli
                .output
                .as_ref()
                .ok_or_else(|| Error::config("--format parquet requires --output DIR"))?;
            sink = sink.with(Box::new(ParquetSink::new(dir, ParquetWriterConfig::default())?));
        }

        let capacity = tap.sync_config(&options)?.channel_capacity;

        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping before the next page");
                    cancel.cancel();
                }
            }
        });
        options.cancel = Some(cancel);

        let (tx, rx) = mpsc::channel(capacity);
        let writer = spawn_sink(sink, rx);

        let report = tap.read(options, tx).await;
        interrupt.abort();

        writer
            .await
            .map_err(|e| Error::output(format!("output task failed: {e}")))??;
        let report = report?;

        eprint!("{}", report.summary_table());
        report.into_result().map(|_| ())
    }
}

/// Output a message as one JSON line
fn output_message(msg: &Value) {
    println!("{}", serde_json::to_string(msg).unwrap_or_default());
}
