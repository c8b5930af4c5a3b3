//! Tap configuration
//!
//! The user-supplied settings for a sync run: credentials, the optional
//! start date for search endpoints, page size, user agent and the page
//! safety cap. Loaded once at startup and read-only afterwards.

use crate::error::{Error, Result};
use crate::types::OptionStringExt;
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;

/// Settings for a sync run
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TapConfig {
    /// API token sent in the `X-Simplesat-Token` header
    pub auth_token: String,

    /// Earliest record date, forwarded to the search endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Records per page requested from the API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Overrides the default User-Agent header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Stop a stream with an error after this many pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<u32>,
}

impl std::fmt::Debug for TapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TapConfig")
            .field("auth_token", &"***")
            .field("start_date", &self.start_date)
            .field("page_size", &self.page_size)
            .field("user_agent", &self.user_agent)
            .field("max_pages", &self.max_pages)
            .finish()
    }
}

/// A property of the published configuration schema
struct ConfigProperty {
    name: &'static str,
    json_type: &'static str,
    format: Option<&'static str>,
    required: bool,
    secret: bool,
    description: &'static str,
}

const CONFIG_PROPERTIES: &[ConfigProperty] = &[
    ConfigProperty {
        name: "auth_token",
        json_type: "string",
        format: None,
        required: true,
        secret: true,
        description: "The token to authenticate against the API service",
    },
    ConfigProperty {
        name: "start_date",
        json_type: "string",
        format: Some("date-time"),
        required: false,
        secret: false,
        description: "The earliest record date to sync",
    },
    ConfigProperty {
        name: "page_size",
        json_type: "integer",
        format: None,
        required: false,
        secret: false,
        description: "Number of records requested per page",
    },
    ConfigProperty {
        name: "user_agent",
        json_type: "string",
        format: None,
        required: false,
        secret: false,
        description: "User-Agent header sent with every request",
    },
    ConfigProperty {
        name: "max_pages",
        json_type: "integer",
        format: None,
        required: false,
        secret: false,
        description: "Safety limit on the number of pages fetched per stream",
    },
];

impl TapConfig {
    /// Create a config with only a token set
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            ..Default::default()
        }
    }

    /// Set the start date
    #[must_use]
    pub fn with_start_date(mut self, start_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the page safety cap
    #[must_use]
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Build a config from a JSON value and validate it
    pub fn from_value(value: Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::config("Config must be a JSON object"))?;

        if !obj.contains_key("auth_token") || obj["auth_token"].is_null() {
            return Err(Error::missing_field("auth_token"));
        }

        let mut config: TapConfig = serde_json::from_value(value)
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;
        config.user_agent = config.user_agent.take().none_if_empty();
        config.start_date = config.start_date.take().none_if_empty();
        config.validate()?;
        Ok(config)
    }

    /// Parse a config from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid config JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Load a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Check values that deserialization alone cannot
    pub fn validate(&self) -> Result<()> {
        if let Some(start_date) = &self.start_date {
            DateTime::parse_from_rfc3339(start_date).map_err(|e| {
                Error::invalid_value("start_date", format!("expected an RFC 3339 timestamp: {e}"))
            })?;
        }

        if self.max_pages == Some(0) {
            return Err(Error::invalid_value("max_pages", "must be greater than zero"));
        }

        Ok(())
    }

    /// Page size to send, if any
    pub fn effective_page_size(&self) -> Option<u32> {
        self.page_size.filter(|size| *size > 0)
    }

    /// JSON Schema describing the accepted configuration
    pub fn json_schema() -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for prop in CONFIG_PROPERTIES {
            let mut schema = json!({
                "type": [prop.json_type, "null"],
                "description": prop.description,
            });
            if prop.required {
                schema["type"] = json!(prop.json_type);
                required.push(prop.name);
            }
            if let Some(format) = prop.format {
                schema["format"] = json!(format);
            }
            if prop.secret {
                schema["secret"] = json!(true);
                schema["writeOnly"] = json!(true);
            }
            properties.insert(prop.name.to_string(), schema);
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
