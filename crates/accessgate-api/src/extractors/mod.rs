//! Custom Axum extractors.

pub mod json;
pub mod source;

pub use json::ValidatedJson;
pub use source::request_source;
