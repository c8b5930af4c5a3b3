//! Request building
//!
//! Turns (config, resource, cursor) into a fully specified request. Pure:
//! no I/O, no retries, nothing that can fail.

use crate::config::TapConfig;
use crate::pagination::Cursor;
use crate::streams::ResourceDefinition;
use crate::types::Method;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Root of the Simplesat v1 API
pub const DEFAULT_BASE_URL: &str = "https://api.simplesat.io/api/v1";

/// Header carrying the API token
pub const AUTH_HEADER: &str = "X-Simplesat-Token";

/// A request ready to be sent
#[derive(Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub query: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    /// JSON body, absent rather than empty when there is nothing to send
    pub body: Option<Value>,
}

impl std::fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .headers
            .iter()
            .map(|(k, v)| {
                if k == AUTH_HEADER {
                    (k.as_str(), "***")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();

        f.debug_struct("PreparedRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &self.query)
            .field("headers", &headers)
            .field("body", &self.body)
            .finish()
    }
}

/// Builds requests for one tap instance
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    base_url: &'a str,
    config: &'a TapConfig,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(base_url: &'a str, config: &'a TapConfig) -> Self {
        Self { base_url, config }
    }

    /// Build the request for a page of `resource`
    pub fn build(&self, resource: &ResourceDefinition, cursor: Option<&Cursor>) -> PreparedRequest {
        PreparedRequest {
            method: resource.method,
            url: self.url(resource),
            query: self.query_params(cursor),
            headers: self.headers(),
            body: self.payload(resource),
        }
    }

    /// Base URL joined with the resource path
    pub fn url(&self, resource: &ResourceDefinition) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = resource.path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    /// `page_size` when configured, overridden by the cursor's own pairs
    pub fn query_params(&self, cursor: Option<&Cursor>) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(page_size) = self.config.effective_page_size() {
            params.insert("page_size".to_string(), page_size.to_string());
        }
        if let Some(cursor) = cursor {
            params.extend(cursor.query_pairs());
        }
        params
    }

    /// Search body for POST resources; `None` when there is no filter
    pub fn payload(&self, resource: &ResourceDefinition) -> Option<Value> {
        if !resource.method.has_body() {
            return None;
        }
        self.config
            .start_date
            .as_ref()
            .map(|start_date| json!({ "start_date": start_date }))
    }

    /// Auth header (possibly empty) plus the configured user agent
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(AUTH_HEADER.to_string(), self.config.auth_token.clone());
        if let Some(user_agent) = &self.config.user_agent {
            headers.insert("User-Agent".to_string(), user_agent.clone());
        }
        headers
    }
}
