//! Improvado MCP - authorization gateway for LLM tool access
//!
//! This crate runs an MCP server that lets LLM clients reach Improvado and
//! Notion on a user's behalf. Users authorize through a consent screen where
//! they supply an Improvado API key; the key travels with the session and is
//! exchanged for downstream credentials on every tool call.

pub mod auth;
pub mod config;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod routing;
pub mod utils;
pub mod web;

pub use config::Config;
pub use error::{GatewayError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Default server host
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_PORT: u16 = 3001;
