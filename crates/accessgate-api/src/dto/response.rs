//! Response DTOs.

use serde::Serialize;

use accessgate_entity::control::{ControlQueueStats, ControlRequest};
use accessgate_service::DrainReport;

/// Payload of a control action.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ControlActionResponse {
    /// Requests resolved by a `process_pending` drain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_requests: Option<usize>,
    /// Requests created or found outstanding by a queueing action.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<ControlRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<DrainReport>,
}

/// Queue listing.
#[derive(Debug, Clone, Serialize)]
pub struct ControlRequestList {
    pub requests: Vec<ControlRequest>,
    pub stats: ControlQueueStats,
}

/// Liveness payload.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub version: String,
    pub uptime_seconds: u64,
    /// `connected` or `unavailable`.
    pub store: String,
}

/// A single session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub session: accessgate_entity::session::RadiusSession,
}
