//! Routing module for directing tool calls to Improvado and Notion

pub mod dispatcher;
pub mod requests;
pub mod types;

pub use dispatcher::{ToolDispatcher, MISSING_API_KEY_MESSAGE};
pub use requests::build_request;
pub use types::*;
