//! # accessgate-entity
//!
//! Domain entity models for AccessGate. Every struct in this crate
//! represents a database table row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod accounting;
pub mod control;
pub mod nas;
pub mod profile;
pub mod session;
