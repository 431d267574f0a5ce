//! Shared utilities for the gateway

pub mod markdown;

pub use markdown::{fenced_json, to_markdown};
