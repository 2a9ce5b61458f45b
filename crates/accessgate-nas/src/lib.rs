//! # accessgate-nas
//!
//! The boundary between AccessGate and network access equipment. Control
//! commands go through the [`adapter::NasAdapter`] trait; the
//! [`registry::NasAdapterRegistry`] picks the implementation for a NAS from
//! its device record's connection method.

pub mod adapter;
pub mod adapters;
pub mod method;
pub mod registry;

pub use adapter::{ControlCommand, NasAdapter, NasResponse};
pub use method::ConnectionMethod;
pub use registry::NasAdapterRegistry;
