//! Error handling module for the gateway
//!
//! Provides the crate-wide error type and result alias.

mod error;

pub use error::{GatewayError, Result};
