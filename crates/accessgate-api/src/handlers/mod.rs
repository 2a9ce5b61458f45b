//! HTTP request handlers.

pub mod accounting;
pub mod control;
pub mod health;
pub mod sessions;
