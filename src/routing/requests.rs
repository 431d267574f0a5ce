//! Mapping from tool arguments to downstream HTTP requests

use crate::error::{GatewayError, Result};
use crate::registry::Operation;
use crate::routing::types::DownstreamRequest;
use reqwest::Method;
use serde_json::{json, Map, Value};

/// Path of the Improvado query endpoint, relative to the Improvado base URL
pub const QUERY_PATH: &str = "/api/gpt/query";

fn required_str<'a>(arguments: &'a Value, name: &str) -> Result<&'a str> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| GatewayError::validation(format!("'{}' is required", name)))
}

fn required<'a>(arguments: &'a Value, name: &str) -> Result<&'a Value> {
    supplied(arguments, name)
        .ok_or_else(|| GatewayError::validation(format!("'{}' is required", name)))
}

fn supplied<'a>(arguments: &'a Value, name: &str) -> Option<&'a Value> {
    arguments.get(name).filter(|value| !value.is_null())
}

/// Percent-encoded path segment taken from an id argument
fn id_segment(arguments: &Value, name: &str) -> Result<String> {
    Ok(urlencoding::encode(required_str(arguments, name)?).into_owned())
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn with_pagination(mut request: DownstreamRequest, arguments: &Value) -> DownstreamRequest {
    for key in ["start_cursor", "page_size"] {
        if let Some(value) = supplied(arguments, key) {
            request = request.with_query(key, query_value(value));
        }
    }
    request
}

/// Body built from whichever of `fields` the caller supplied
fn optional_fields(arguments: &Value, fields: &[&str]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|field| supplied(arguments, field).map(|v| (field.to_string(), v.clone())))
        .collect()
}

pub fn build_request(operation: Operation, arguments: &Value) -> Result<DownstreamRequest> {
    let request = match operation {
        Operation::ExecuteQuery => {
            let params = supplied(arguments, "params").cloned().unwrap_or_else(|| json!([]));
            DownstreamRequest::new(Method::POST, QUERY_PATH).with_body(json!({
                "query": required_str(arguments, "query")?,
                "params": params,
            }))
        }

        Operation::AppendBlockChildren => {
            let mut body = optional_fields(arguments, &["after"]);
            body.insert("children".to_string(), required(arguments, "children")?.clone());
            DownstreamRequest::new(
                Method::PATCH,
                format!("/blocks/{}/children", id_segment(arguments, "block_id")?),
            )
            .with_body(Value::Object(body))
        }
        Operation::RetrieveBlock => DownstreamRequest::new(
            Method::GET,
            format!("/blocks/{}", id_segment(arguments, "block_id")?),
        ),
        Operation::RetrieveBlockChildren => with_pagination(
            DownstreamRequest::new(
                Method::GET,
                format!("/blocks/{}/children", id_segment(arguments, "block_id")?),
            ),
            arguments,
        ),
        Operation::DeleteBlock => DownstreamRequest::new(
            Method::DELETE,
            format!("/blocks/{}", id_segment(arguments, "block_id")?),
        ),

        Operation::RetrievePage => DownstreamRequest::new(
            Method::GET,
            format!("/pages/{}", id_segment(arguments, "page_id")?),
        ),
        Operation::UpdatePageProperties => DownstreamRequest::new(
            Method::PATCH,
            format!("/pages/{}", id_segment(arguments, "page_id")?),
        )
        .with_body(json!({ "properties": required(arguments, "properties")? })),

        Operation::ListAllUsers => {
            with_pagination(DownstreamRequest::new(Method::GET, "/users"), arguments)
        }
        Operation::RetrieveUser => DownstreamRequest::new(
            Method::GET,
            format!("/users/{}", id_segment(arguments, "user_id")?),
        ),
        Operation::RetrieveBotUser => DownstreamRequest::new(Method::GET, "/users/me"),

        Operation::CreateDatabase => DownstreamRequest::new(Method::POST, "/databases").with_body(json!({
            "parent": required(arguments, "parent")?,
            "title": required(arguments, "title")?,
            "properties": required(arguments, "properties")?,
        })),
        Operation::QueryDatabase => DownstreamRequest::new(
            Method::POST,
            format!("/databases/{}/query", id_segment(arguments, "database_id")?),
        )
        .with_body(Value::Object(optional_fields(
            arguments,
            &["filter", "sorts", "start_cursor", "page_size"],
        ))),
        Operation::RetrieveDatabase => DownstreamRequest::new(
            Method::GET,
            format!("/databases/{}", id_segment(arguments, "database_id")?),
        ),
        Operation::UpdateDatabase => DownstreamRequest::new(
            Method::PATCH,
            format!("/databases/{}", id_segment(arguments, "database_id")?),
        )
        .with_body(Value::Object(optional_fields(
            arguments,
            &["title", "description", "properties"],
        ))),
        Operation::CreateDatabaseItem => DownstreamRequest::new(Method::POST, "/pages").with_body(json!({
            "parent": { "database_id": required_str(arguments, "database_id")? },
            "properties": required(arguments, "properties")?,
        })),

        Operation::CreateComment => {
            let mut body = optional_fields(arguments, &["parent", "discussion_id"]);
            body.insert("rich_text".to_string(), required(arguments, "rich_text")?.clone());
            DownstreamRequest::new(Method::POST, "/comments").with_body(Value::Object(body))
        }
        Operation::RetrieveComments => with_pagination(
            DownstreamRequest::new(Method::GET, "/comments")
                .with_query("block_id", required_str(arguments, "block_id")?),
            arguments,
        ),

        Operation::Search => DownstreamRequest::new(Method::POST, "/search").with_body(Value::Object(
            optional_fields(arguments, &["query", "filter", "sort", "start_cursor", "page_size"]),
        )),
    };

    Ok(request)
}
