//! Core type definitions used across the AccessGate workspace.

pub mod id;
pub mod response;

pub use id::*;
pub use response::{ApiResponse, ResponseStatus};
