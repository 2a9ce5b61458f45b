//! Access policy and usage accumulation entities.

pub mod model;
pub mod usage;

pub use model::AccessProfile;
pub use usage::UserAccess;
