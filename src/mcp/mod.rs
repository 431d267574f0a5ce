//! MCP (Model Context Protocol) implementation
//!
//! Wire types, JSON-RPC errors, and the HTTP server exposing the consent
//! flow and the MCP endpoint.

pub mod errors;
pub mod server;
pub mod types;

pub use errors::{McpError, McpErrorCode};
pub use server::{configure_routes, GatewayServer, INVALID_REQUEST_BODY};
pub use types::*;
