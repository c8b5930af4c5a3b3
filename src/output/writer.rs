//! Parquet file writer
//!
//! Buffers a stream's records and writes them as Arrow RecordBatches.

use super::schema::{arrow_schema, json_to_arrow, prepare_record};
use crate::error::{Error, Result};
use crate::schema::Field;
use arrow::datatypes::SchemaRef;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration for Parquet writer
#[derive(Debug, Clone)]
pub struct ParquetWriterConfig {
    compression: Compression,
    row_group_size: usize,
    batch_size: usize,
}

impl Default for ParquetWriterConfig {
    fn default() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: 1024 * 1024, // 1M rows
            batch_size: 1000,
        }
    }
}

impl ParquetWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set compression algorithm
    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Set row group size
    #[must_use]
    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Records buffered before a batch is written
    #[must_use]
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Use no compression
    #[must_use]
    pub fn uncompressed(mut self) -> Self {
        self.compression = Compression::UNCOMPRESSED;
        self
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn build_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }
}

/// Parquet writer for one stream
pub struct ParquetWriter {
    writer: ArrowWriter<File>,
    schema: SchemaRef,
    fields: &'static [Field],
    pending: Vec<Value>,
    batch_size: usize,
    rows_written: usize,
    path: PathBuf,
}

impl ParquetWriter {
    /// Create the file at `path` with columns for `fields`
    pub fn new(
        path: impl AsRef<Path>,
        fields: &'static [Field],
        config: &ParquetWriterConfig,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| Error::Output {
            message: format!("Failed to create {}: {e}", path.display()),
        })?;

        let schema: SchemaRef = Arc::new(arrow_schema(fields));
        let writer = ArrowWriter::try_new(file, schema.clone(), Some(config.build_properties()))
            .map_err(|e| Error::Output {
                message: format!("Failed to create Parquet writer: {e}"),
            })?;

        Ok(Self {
            writer,
            schema,
            fields,
            pending: Vec::with_capacity(config.batch_size),
            batch_size: config.batch_size,
            rows_written: 0,
            path,
        })
    }

    /// Buffer a record, writing a batch once the buffer is full
    pub fn push(&mut self, record: &Value) -> Result<()> {
        self.pending.push(prepare_record(self.fields, record));
        if self.pending.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Write buffered records as one batch
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let batch = json_to_arrow(&self.schema, &self.pending)?;
        self.writer.write(&batch).map_err(|e| Error::Output {
            message: format!("Failed to write batch: {e}"),
        })?;

        self.rows_written += batch.num_rows();
        self.pending.clear();
        Ok(())
    }

    /// Rows written so far, excluding the buffer
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and finalize the file, returning the row count
    pub fn close(mut self) -> Result<usize> {
        self.flush()?;
        let rows = self.rows_written;
        self.writer.close().map_err(|e| Error::Output {
            message: format!("Failed to close Parquet writer: {e}"),
        })?;
        Ok(rows)
    }
}

impl std::fmt::Debug for ParquetWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetWriter")
            .field("path", &self.path)
            .field("pending", &self.pending.len())
            .field("rows_written", &self.rows_written)
            .finish_non_exhaustive()
    }
}
