//! Tool dispatch: from an accepted tool call to a text result

use crate::auth::{CredentialVerifier, SessionProps};
use crate::config::Config;
use crate::error::Result;
use crate::mcp::{Tool, ToolCall, ToolResult};
use crate::registry::{self, Downstream, Operation, ToolDescriptor};
use crate::routing::requests::build_request;
use crate::routing::types::{DownstreamRequest, OutputFormat, ToolFailure};
use crate::utils::to_markdown;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const MISSING_API_KEY_MESSAGE: &str =
    "❌ Improvado API key is not configured. Please go through the authorization process again.";

/// Dispatches tool calls to Improvado and Notion on behalf of a session
pub struct ToolDispatcher {
    client: Client,
    verifier: Arc<CredentialVerifier>,
    improvado_base_url: String,
    notion_base_url: String,
    notion_version: String,
}

impl ToolDispatcher {
    pub fn new(config: &Config, verifier: Arc<CredentialVerifier>) -> Result<Self> {
        let client = Client::builder().use_rustls_tls().build()?;
        Ok(Self {
            client,
            verifier,
            improvado_base_url: config.verification.base_url.trim_end_matches('/').to_string(),
            notion_base_url: config.notion.base_url.trim_end_matches('/').to_string(),
            notion_version: config.notion.version.clone(),
        })
    }

    /// Tool definitions advertised on `tools/list`
    pub fn list_tools(&self) -> Vec<Tool> {
        registry::all().iter().map(ToolDescriptor::to_tool).collect()
    }

    /// Invoke a tool for a session
    ///
    /// Returns `Err` only for an unknown tool or arguments that do not match
    /// the tool's schema. Everything after that, including a missing API key
    /// and downstream failures, comes back as a text result.
    pub async fn invoke(&self, call: &ToolCall, session: &SessionProps) -> Result<ToolResult> {
        let descriptor = registry::resolve(&call.name, &call.arguments)?;
        let request = build_request(descriptor.operation, &call.arguments)?;

        let api_key = match session.api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => key,
            None => {
                info!("Tool '{}' called without an Improvado API key", call.name);
                return Ok(ToolResult::text(MISSING_API_KEY_MESSAGE));
            }
        };

        let format = if descriptor.supports_format() {
            OutputFormat::from_arguments(&call.arguments)
        } else {
            OutputFormat::Json
        };

        let outcome = self.execute(descriptor, request, api_key, format).await;
        Ok(into_envelope(descriptor, outcome))
    }

    async fn execute(
        &self,
        descriptor: &ToolDescriptor,
        request: DownstreamRequest,
        api_key: &str,
        format: OutputFormat,
    ) -> std::result::Result<String, ToolFailure> {
        let downstream = descriptor.downstream();
        let bearer = match downstream.exchange_provider() {
            Some(provider) => self.verifier.exchange(api_key, provider).await?,
            None => Secret::new(api_key.to_string()),
        };

        let response = self.send(downstream, &request, &bearer).await?;
        let body = read_json(response).await?;

        match descriptor.operation {
            Operation::ExecuteQuery => render_query_result(&body),
            _ => Ok(match format {
                OutputFormat::Markdown => to_markdown(&body),
                OutputFormat::Json => pretty(&body),
            }),
        }
    }

    async fn send(
        &self,
        downstream: Downstream,
        request: &DownstreamRequest,
        bearer: &Secret<String>,
    ) -> std::result::Result<Response, ToolFailure> {
        let base = match downstream {
            Downstream::Improvado => &self.improvado_base_url,
            Downstream::Notion => &self.notion_base_url,
        };
        let url = format!("{}{}", base, request.path);
        debug!("{} {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .bearer_auth(bearer.expose_secret())
            .headers(self.headers_for(downstream));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(ToolFailure::Transport)
    }

    fn headers_for(&self, downstream: Downstream) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if downstream == Downstream::Notion {
            if let Ok(version) = HeaderValue::from_str(&self.notion_version) {
                headers.insert("Notion-Version", version);
            }
        }
        headers
    }
}

/// The single place where tool outcomes become the text envelope
fn into_envelope(
    descriptor: &ToolDescriptor,
    outcome: std::result::Result<String, ToolFailure>,
) -> ToolResult {
    match outcome {
        Ok(text) => ToolResult::text(text),
        Err(failure) => {
            warn!("Tool '{}' failed: {}", descriptor.name, failure);
            let action = match descriptor.downstream() {
                Downstream::Improvado => "executing query",
                Downstream::Notion => "calling Notion",
            };
            ToolResult::text(format!("❌ Error {}: {}", action, failure))
        }
    }
}

/// Read a response body as JSON, turning non-2xx statuses into failures
async fn read_json(response: Response) -> std::result::Result<Value, ToolFailure> {
    let status = response.status();
    let text = response.text().await.map_err(ToolFailure::Transport)?;

    if !status.is_success() {
        let message = match serde_json::from_str::<Value>(&text) {
            Ok(body) => body
                .get("error")
                .or_else(|| body.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or(text),
            Err(_) if !text.trim().is_empty() => text,
            Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
        };
        return Err(ToolFailure::Api { status, message });
    }

    serde_json::from_str(&text).map_err(|e| ToolFailure::InvalidJson(e.to_string()))
}

fn render_query_result(body: &Value) -> std::result::Result<String, ToolFailure> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let error = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error");
        return Err(ToolFailure::QueryFailed(error.to_string()));
    }
    let data = body.get("data").unwrap_or(&Value::Null);
    Ok(format!("Query result:\n{}", pretty(data)))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
