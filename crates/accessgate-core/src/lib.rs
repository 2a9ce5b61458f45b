//! # accessgate-core
//!
//! Core crate for AccessGate. Contains configuration schemas, typed
//! identifiers, the response envelope shared by every boundary, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other AccessGate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
