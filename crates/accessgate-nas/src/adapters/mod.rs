//! Bundled adapter implementations.

pub mod http;
pub mod simulated;

pub use http::HttpNasAdapter;
pub use simulated::SimulatedNasAdapter;
