//! Output module
//!
//! Handles message framing on stdout and Parquet file writing.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Deriving Arrow schemas from declared stream fields
//! - Converting JSON records to Arrow RecordBatches
//! - Writing Parquet files, one per stream
//! - Message sinks fed by the sync engine over a channel

mod schema;
mod sink;
mod writer;

pub use schema::{arrow_schema, arrow_type, json_to_arrow, prepare_record};
pub use sink::{spawn_sink, FanOut, JsonLinesSink, MessageSink, ParquetSink};
pub use writer::{ParquetWriter, ParquetWriterConfig};
