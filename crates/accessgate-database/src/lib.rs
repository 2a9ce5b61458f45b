//! # accessgate-database
//!
//! Store contracts for sessions, usage, profiles, control requests and NAS
//! devices, with a PostgreSQL implementation (one repository per table) and
//! a process-local implementation for single-node deployments and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use store::{
    ControlRequestStore, NasDeviceStore, ProfileStore, SessionStore, SessionWrite, Stores,
};
