//! Configuration module for the gateway
//!
//! This module provides configuration management and loading utilities.

mod config;

pub use config::{Config, LoggingConfig, NotionConfig, ServerConfig, VerificationConfig};
