//! Drain reporting.

use serde::Serialize;

use accessgate_core::types::ControlRequestId;
use accessgate_entity::control::{ControlRequestType, ControlStatus};

/// Outcome for one dispatched request.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub request_id: ControlRequestId,
    pub session_id: String,
    pub request_type: ControlRequestType,
    /// `ack` or `nak`; `sent` if the outcome could not be recorded.
    pub status: ControlStatus,
    pub response_code: Option<i32>,
    pub error: Option<String>,
    /// Adapter that handled the request, if one was resolved.
    pub adapter: Option<String>,
}

/// Summary of one drain.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrainReport {
    /// Requests claimed from the queue.
    pub claimed: usize,
    /// Resolved `ack`.
    pub acked: usize,
    /// Resolved `nak`.
    pub naked: usize,
    /// Adapter calls that hit the timeout (also counted in `naked`).
    pub timed_out: usize,
    /// Claimed requests whose outcome could not be recorded.
    pub unresolved: usize,
    /// Sessions finalized `stopped` by an acknowledged disconnect.
    pub sessions_stopped: usize,
    pub results: Vec<DispatchResult>,
}

impl DrainReport {
    /// Requests that reached `ack` or `nak`.
    pub fn processed(&self) -> usize {
        self.acked + self.naked
    }

    pub(crate) fn record(&mut self, result: DispatchResult, timed_out: bool, stopped: bool) {
        match result.status {
            ControlStatus::Ack => self.acked += 1,
            ControlStatus::Nak => self.naked += 1,
            ControlStatus::Pending | ControlStatus::Sent => self.unresolved += 1,
        }
        if timed_out {
            self.timed_out += 1;
        }
        if stopped {
            self.sessions_stopped += 1;
        }
        self.results.push(result);
    }
}
