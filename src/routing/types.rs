//! Types shared by tool dispatch

use crate::auth::VerificationError;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Rendering requested through the `format` argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_arguments(arguments: &Value) -> Self {
        match arguments.get(crate::registry::FORMAT_PARAM).and_then(Value::as_str) {
            Some("markdown") => OutputFormat::Markdown,
            _ => OutputFormat::Json,
        }
    }
}

/// A single downstream HTTP call, relative to the service base URL
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<Value>,
}

impl DownstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Anything that went wrong after a tool call was accepted. These are
/// reported to the caller as text, never as protocol errors.
#[derive(Error, Debug)]
pub enum ToolFailure {
    #[error("Failed to verify Notion API key: {0}")]
    Exchange(#[from] VerificationError),

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API returned an error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Failed to parse API response as JSON: {0}")]
    InvalidJson(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}
