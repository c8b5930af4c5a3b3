// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # tap-simplesat
//!
//! Extracts surveys, questions, responses and answers from the Simplesat
//! REST API and emits them as Singer-style JSON messages, optionally also
//! as one Parquet file per stream.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tap_simplesat::{ReadOptions, Tap, TapConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> tap_simplesat::Result<()> {
//!     let tap = Tap::new(TapConfig::new("my-token").with_page_size(100))?;
//!
//!     let (tx, mut rx) = mpsc::channel(1024);
//!     let printer = tokio::spawn(async move {
//!         while let Some(msg) = rx.recv().await {
//!             println!("{}", msg.to_json_line().unwrap());
//!         }
//!     });
//!
//!     let report = tap.read(ReadOptions::default(), tx).await?;
//!     printer.await.unwrap();
//!     report.into_result()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Tap                                │
//! │  spec()   check()   discover()   read(options) -> SyncReport │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────┬────────────┬─────┴──────┬────────────┬────────────┐
//! │ Streams  │   HTTP     │  Paginate  │   Decode   │   Output   │
//! ├──────────┼────────────┼────────────┼────────────┼────────────┤
//! │ answers  │ Request    │ next URL   │ JSONPath   │ JSON lines │
//! │ questions│ Retry      │ Page cap   │ Conform    │ Parquet    │
//! │ responses│ Rate Limit │            │ Skip       │            │
//! │ surveys  │ Backoff    │            │            │            │
//! └──────────┴────────────┴────────────┴────────────┴────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Tap configuration
pub mod config;

/// Declared field tables and JSON Schema rendering
pub mod schema;

/// Resource definitions
pub mod streams;

/// Request building and HTTP client with retry and rate limiting
pub mod http;

/// Next-URL pagination
pub mod pagination;

/// Response decoding and record post-processing
pub mod decode;

/// Sync engine
pub mod engine;

/// JSON lines and Parquet output
pub mod output;

/// Tap operations
pub mod tap;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::TapConfig;
pub use engine::{Message, SyncConfig, SyncReport};
pub use error::{Error, Result};
pub use tap::{Catalog, CheckResult, ReadOptions, Tap};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
