//! Response decoder module
//!
//! # Overview
//!
//! Parses response bodies, pulls the record array out with a JSONPath and
//! runs each record through a [`PostProcess`] step that can reshape or skip
//! it.

mod extractor;
mod process;

pub use extractor::{parse_body, RecordExtractor};
pub use process::{ConformToSchema, Identity, PostProcess};

#[cfg(test)]
mod tests;
