//! Pagination module
//!
//! # Overview
//!
//! Simplesat pages by handing back the URL of the next page in a top-level
//! `next` field. The paginator turns that field into a [`Cursor`]; the
//! request builder reuses the cursor's query string on the next request.

mod strategies;
mod types;

pub use strategies::NextUrlPaginator;
pub use types::{Cursor, PaginationState, Paginator};
