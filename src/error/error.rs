//! Error types and handling for the Improvado gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Authentication errors (bad or unknown session tokens, malformed authorize requests)
    #[error("Authentication error: {message}")]
    Auth { message: String },

    /// Failures reported by the authorization engine
    #[error("Authorization engine error: {message}")]
    Engine { message: String },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Unknown tool name on dispatch
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GatewayError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an authorization engine error
    pub fn engine<S: Into<String>>(message: S) -> Self {
        Self::Engine {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an unknown tool error
    pub fn unknown_tool<S: Into<String>>(name: S) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            GatewayError::Config { .. } => "config",
            GatewayError::Auth { .. } => "auth",
            GatewayError::Engine { .. } => "engine",
            GatewayError::Validation { .. } => "validation",
            GatewayError::UnknownTool { .. } => "unknown_tool",
            GatewayError::Io(_) => "io",
            GatewayError::Serde(_) => "serialization",
            GatewayError::Http(_) => "http",
        }
    }
}
