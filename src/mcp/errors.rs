//! MCP-compliant error handling
//!
//! JSON-RPC 2.0 error codes and the error object carried in responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::error::GatewayError;

/// JSON-RPC 2.0 error codes used by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
}

impl McpErrorCode {
    /// Get the error code as i32
    pub fn code(&self) -> i32 {
        *self as i32
    }

    /// Get a default message for this error code
    pub fn default_message(&self) -> &'static str {
        match self {
            McpErrorCode::ParseError => "Parse error",
            McpErrorCode::InvalidRequest => "Invalid request",
            McpErrorCode::MethodNotFound => "Method not found",
            McpErrorCode::InvalidParams => "Invalid params",
            McpErrorCode::InternalError => "Internal error",
        }
    }
}

/// MCP-compliant error structure following JSON-RPC 2.0 specification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpError {
    pub fn new(code: McpErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(code: McpErrorCode, message: impl Into<String>, data: Value) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(McpErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(McpErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::with_data(
            McpErrorCode::MethodNotFound,
            format!("Method '{}' not found", method),
            serde_json::json!({ "method": method }),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(McpErrorCode::InvalidParams, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(McpErrorCode::InternalError, message)
    }
}

/// Errors that escape tool dispatch are caller mistakes (unknown tool, bad
/// arguments) or internal faults; downstream failures never get here.
impl From<GatewayError> for McpError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::UnknownTool { name } => McpError::with_data(
                McpErrorCode::InvalidParams,
                format!("Unknown tool: {}", name),
                serde_json::json!({ "tool_name": name }),
            ),
            GatewayError::Validation { message } => McpError::invalid_params(message),
            other => McpError::with_data(
                McpErrorCode::InternalError,
                other.to_string(),
                serde_json::json!({ "category": other.category() }),
            ),
        }
    }
}
