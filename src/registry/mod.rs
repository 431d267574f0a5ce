//! Tool registry: the static table of exposed tools and their schemas

pub mod catalog;
pub mod types;

pub use catalog::{all, find, resolve};
pub use types::*;
