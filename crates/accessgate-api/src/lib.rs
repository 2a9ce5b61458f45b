//! # accessgate-api
//!
//! HTTP API layer for AccessGate built on Axum.
//!
//! Provides the RADIUS accounting and control endpoints, session
//! registration and lookup, health, per-group rate limiting, request
//! logging, DTOs and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
