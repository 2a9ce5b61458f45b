//! NAS equipment entities.

pub mod model;

pub use model::NasDevice;
