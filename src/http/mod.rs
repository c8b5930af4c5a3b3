//! HTTP module
//!
//! Request building plus a client with retry, rate limiting, and backoff.
//!
//! # Features
//!
//! - **Request Building**: URL, query, headers and search body per resource
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor

mod client;
mod rate_limit;
mod request;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use request::{PreparedRequest, RequestBuilder, AUTH_HEADER, DEFAULT_BASE_URL};
