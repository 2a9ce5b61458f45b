//! Session registration and queries.

pub mod service;

pub use service::{SessionDetail, SessionService};
