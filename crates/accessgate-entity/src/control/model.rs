//! Control request entity model.

use accessgate_core::types::ControlRequestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::attributes::ControlAttributes;
use super::status::{ControlRequestType, ControlStatus};

/// A queued command to a NAS. Never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ControlRequest {
    /// Request identifier.
    pub id: ControlRequestId,
    /// Target session.
    pub session_id: String,
    /// Disconnect or reauthorize.
    pub request_type: ControlRequestType,
    /// Reason and parameters.
    #[sqlx(json)]
    pub attributes: ControlAttributes,
    /// NAS that owns the session, captured at enqueue time.
    pub nas_ip_address: String,
    /// NAS port identifier.
    pub nas_port_id: Option<String>,
    /// Delivery status.
    pub status: ControlStatus,
    /// Response code reported by the adapter.
    pub response_code: Option<i32>,
    /// Failure description for `nak`.
    pub error_message: Option<String>,
    /// The `nak` request this one was requeued from.
    pub requeued_from: Option<ControlRequestId>,
    /// When the request was queued.
    pub created_at: DateTime<Utc>,
    /// When a drain claimed it.
    pub sent_at: Option<DateTime<Utc>>,
    /// When the outcome was recorded.
    pub response_at: Option<DateTime<Utc>>,
}

impl ControlRequest {
    /// Build a pending request.
    pub fn pending(new: NewControlRequest, now: DateTime<Utc>) -> Self {
        Self {
            id: ControlRequestId::new(),
            session_id: new.session_id,
            request_type: new.request_type,
            attributes: new.attributes,
            nas_ip_address: new.nas_ip_address,
            nas_port_id: new.nas_port_id,
            status: ControlStatus::Pending,
            response_code: None,
            error_message: None,
            requeued_from: new.requeued_from,
            created_at: now,
            sent_at: None,
            response_at: None,
        }
    }
}

/// Data required to queue a control request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewControlRequest {
    /// Target session.
    pub session_id: String,
    /// Disconnect or reauthorize.
    pub request_type: ControlRequestType,
    /// Reason and parameters.
    pub attributes: ControlAttributes,
    /// NAS address.
    pub nas_ip_address: String,
    /// NAS port identifier.
    pub nas_port_id: Option<String>,
    /// Source request when requeueing a `nak`.
    pub requeued_from: Option<ControlRequestId>,
}

/// Result of a guarded enqueue.
#[derive(Debug, Clone)]
pub enum EnqueueOutcome {
    /// A new pending request was created.
    Created(ControlRequest),
    /// A request of the same type was already outstanding for the session.
    Existing(ControlRequest),
}

impl EnqueueOutcome {
    /// Check whether a new request was created.
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    /// Borrow the request.
    pub fn request(&self) -> &ControlRequest {
        match self {
            Self::Created(req) | Self::Existing(req) => req,
        }
    }

    /// Take the request.
    pub fn into_request(self) -> ControlRequest {
        match self {
            Self::Created(req) | Self::Existing(req) => req,
        }
    }
}

/// Request counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlQueueStats {
    pub pending: i64,
    pub sent: i64,
    pub ack: i64,
    pub nak: i64,
}

impl ControlQueueStats {
    /// Add `count` to the bucket for `status`.
    pub fn record(&mut self, status: ControlStatus, count: i64) {
        match status {
            ControlStatus::Pending => self.pending += count,
            ControlStatus::Sent => self.sent += count,
            ControlStatus::Ack => self.ack += count,
            ControlStatus::Nak => self.nak += count,
        }
    }

    /// Total requests.
    pub fn total(&self) -> i64 {
        self.pending + self.sent + self.ack + self.nak
    }
}
