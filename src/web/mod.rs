//! Browser-facing pages for the consent flow

pub mod pages;

pub use pages::{escape_html, render_approved, render_authorize, render_home, render_rejected};
