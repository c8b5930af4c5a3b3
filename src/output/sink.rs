//! Message sinks
//!
//! A sink consumes the engine's messages on a blocking thread. Stdout gets
//! one JSON line per message; Parquet output keeps one file per stream.

use super::writer::{ParquetWriter, ParquetWriterConfig};
use crate::engine::Message;
use crate::error::{Error, Result, ResultExt};
use crate::streams;
use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Destination for sync messages
pub trait MessageSink: Send {
    /// Handle one message
    fn write(&mut self, message: &Message) -> Result<()>;

    /// Flush and close everything; called once after the last message
    fn finish(&mut self) -> Result<()>;
}

// ============================================================================
// JSON Lines
// ============================================================================

/// Writes each message as a single JSON line
pub struct JsonLinesSink<W: Write + Send> {
    out: BufWriter<W>,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
        }
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
    }
}

impl<W: Write + Send> MessageSink for JsonLinesSink<W> {
    fn write(&mut self, message: &Message) -> Result<()> {
        writeln!(self.out, "{}", message.to_json_line()?)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

// ============================================================================
// Parquet
// ============================================================================

/// Writes records to `DIR/<stream>.parquet`.
///
/// A stream's file is created when its SCHEMA message arrives. Records for a
/// stream that never announced a schema are an error.
pub struct ParquetSink {
    dir: PathBuf,
    config: ParquetWriterConfig,
    writers: BTreeMap<String, ParquetWriter>,
    written: BTreeMap<String, usize>,
}

impl ParquetSink {
    /// Create the output directory if needed
    pub fn new(dir: impl AsRef<Path>, config: ParquetWriterConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        Ok(Self {
            dir,
            config,
            writers: BTreeMap::new(),
            written: BTreeMap::new(),
        })
    }

    /// Path of a stream's file
    pub fn file_path(&self, stream: &str) -> PathBuf {
        self.dir.join(format!("{stream}.parquet"))
    }

    /// Rows per closed file, available after [`MessageSink::finish`]
    pub fn written(&self) -> &BTreeMap<String, usize> {
        &self.written
    }
}

impl MessageSink for ParquetSink {
    fn write(&mut self, message: &Message) -> Result<()> {
        match message {
            Message::Schema { stream, .. } => {
                let resource = streams::find(stream).ok_or_else(|| Error::StreamNotFound {
                    stream: stream.clone(),
                })?;
                let writer =
                    ParquetWriter::new(self.file_path(stream), resource.schema, &self.config)?;
                debug!(stream = %stream, path = %writer.path().display(), "Opened Parquet file");
                self.writers.insert(stream.clone(), writer);
            }
            Message::Record { stream, record, .. } => {
                let writer = self.writers.get_mut(stream).ok_or_else(|| {
                    Error::output(format!("record for '{stream}' before its schema"))
                })?;
                writer.push(record)?;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        for (stream, writer) in std::mem::take(&mut self.writers) {
            let path = writer.path().to_path_buf();
            let rows = writer.close()?;
            info!(stream = %stream, rows, path = %path.display(), "Wrote Parquet file");
            self.written.insert(stream, rows);
        }
        Ok(())
    }
}

// ============================================================================
// Fan-out
// ============================================================================

/// Sends every message to each inner sink in turn
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn MessageSink>>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, sink: Box<dyn MessageSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl MessageSink for FanOut {
    fn write(&mut self, message: &Message) -> Result<()> {
        self.sinks.iter_mut().try_for_each(|sink| sink.write(message))
    }

    fn finish(&mut self) -> Result<()> {
        self.sinks.iter_mut().try_for_each(|sink| sink.finish())
    }
}

/// Drain `rx` into `sink` on a blocking thread.
///
/// The task ends when every sender is dropped. On a write error the
/// receiver is closed so the engine's next send fails too.
pub fn spawn_sink<S>(mut sink: S, mut rx: mpsc::Receiver<Message>) -> JoinHandle<Result<S>>
where
    S: MessageSink + 'static,
{
    tokio::task::spawn_blocking(move || {
        while let Some(message) = rx.blocking_recv() {
            if let Err(e) = sink.write(&message) {
                rx.close();
                return Err(e);
            }
        }
        sink.finish()?;
        Ok(sink)
    })
}
