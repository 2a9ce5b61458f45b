//! Control request queue entities.

pub mod attributes;
pub mod model;
pub mod status;

pub use attributes::{ControlAttributes, QuotaKind};
pub use model::{ControlQueueStats, ControlRequest, EnqueueOutcome, NewControlRequest};
pub use status::{ControlRequestType, ControlStatus};
