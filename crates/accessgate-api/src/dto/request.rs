//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use accessgate_core::error::AppError;
use accessgate_core::result::AppResult;
use accessgate_core::types::ProfileId;
use accessgate_entity::accounting::{AccountingEvent, NasMeta};
use accessgate_entity::control::{ControlAttributes, ControlRequestType, ControlStatus};
use accessgate_entity::session::{CounterUpdate, NewSession, TerminateCause, combine_octets};

/// Accounting event posted by a NAS.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AccountingRequest {
    /// `Acct-Session-Id`.
    #[validate(length(min = 1, max = 253, message = "session_id is required"))]
    pub session_id: String,
    pub username: Option<String>,
    pub mac_address: Option<String>,
    pub nas_ip_address: Option<String>,
    pub nas_port_id: Option<String>,
    /// `start`, `interim-update` or `stop`.
    pub status_type: String,
    #[validate(range(min = 0, max = 4294967295_i64))]
    pub session_time: Option<i64>,
    #[validate(range(min = 0))]
    pub input_octets: Option<i64>,
    #[validate(range(min = 0))]
    pub output_octets: Option<i64>,
    #[validate(range(min = 0, max = 4294967295_i64))]
    pub input_gigawords: Option<i64>,
    #[validate(range(min = 0, max = 4294967295_i64))]
    pub output_gigawords: Option<i64>,
    #[validate(range(min = 0))]
    pub input_packets: Option<i64>,
    #[validate(range(min = 0))]
    pub output_packets: Option<i64>,
    pub terminate_cause: Option<String>,
    pub ap_name: Option<String>,
    pub ssid: Option<String>,
}

impl AccountingRequest {
    /// Convert into a domain event. Input octets are what the NAS received
    /// from the client.
    pub fn into_event(self) -> AppResult<AccountingEvent> {
        let status_type = self.status_type.parse()?;
        Ok(AccountingEvent {
            session_id: self.session_id,
            username: self.username,
            status_type,
            counters: CounterUpdate {
                session_time: self.session_time,
                rx_bytes: combine_octets(self.input_octets, self.input_gigawords)?,
                tx_bytes: combine_octets(self.output_octets, self.output_gigawords)?,
                rx_packets: self.input_packets,
                tx_packets: self.output_packets,
            },
            nas: NasMeta {
                nas_ip_address: self.nas_ip_address,
                nas_port_id: self.nas_port_id,
                mac_address: self.mac_address,
                ap_name: self.ap_name,
                ssid: self.ssid,
            },
            terminate_cause: self
                .terminate_cause
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| TerminateCause::parse(&raw)),
        })
    }
}

/// Administrative control action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Disconnect,
    Coa,
    ProcessPending,
}

impl ControlAction {
    /// Request type queued by this action, if it queues one.
    pub fn request_type(&self) -> Option<ControlRequestType> {
        match self {
            Self::Disconnect => Some(ControlRequestType::Disconnect),
            Self::Coa => Some(ControlRequestType::Reauthorize),
            Self::ProcessPending => None,
        }
    }
}

/// `POST /api/radius/control` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ControlActionRequest {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub action: ControlAction,
    /// Defaults to the admin attributes for the action.
    pub attributes: Option<ControlAttributes>,
    #[validate(range(min = 1, max = 1000))]
    pub batch_size: Option<u32>,
}

/// Who a queueing action targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlTarget {
    Session(String),
    User(String),
}

impl ControlActionRequest {
    /// Exactly one of `session_id` / `user_id` must be set.
    pub fn target(&self) -> AppResult<ControlTarget> {
        let session = self.session_id.as_deref().filter(|s| !s.trim().is_empty());
        let user = self.user_id.as_deref().filter(|s| !s.trim().is_empty());
        match (session, user) {
            (Some(id), None) => Ok(ControlTarget::Session(id.to_string())),
            (None, Some(id)) => Ok(ControlTarget::User(id.to_string())),
            (Some(_), Some(_)) => Err(AppError::invalid_request(
                "Provide either session_id or user_id, not both",
            )),
            (None, None) => Err(AppError::invalid_request(
                "session_id or user_id is required",
            )),
        }
    }
}

/// `POST /api/radius/sessions` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterSessionRequest {
    #[validate(length(min = 1, max = 253))]
    pub session_id: String,
    #[validate(length(min = 1, max = 253))]
    pub user_id: String,
    pub profile_id: ProfileId,
    #[validate(length(min = 1, max = 64))]
    pub nas_ip_address: String,
    pub nas_port_id: Option<String>,
    pub mac_address: Option<String>,
}

impl From<RegisterSessionRequest> for NewSession {
    fn from(req: RegisterSessionRequest) -> Self {
        Self {
            session_id: req.session_id,
            user_id: req.user_id,
            profile_id: req.profile_id,
            nas_ip_address: req.nas_ip_address,
            nas_port_id: req.nas_port_id,
            mac_address: req.mac_address,
        }
    }
}

/// Query for `GET /api/radius/control/requests`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

impl ListRequestsQuery {
    /// Parsed status filter.
    pub fn status(&self) -> AppResult<Option<ControlStatus>> {
        self.status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .transpose()
    }

    /// Limit clamped to 1..=500, default 50.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(50).clamp(1, 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_core::ErrorKind;
    use accessgate_entity::accounting::AccountingStatusType;

    fn accounting(status_type: &str) -> AccountingRequest {
        serde_json::from_value(serde_json::json!({
            "session_id": "s1",
            "username": "alice",
            "status_type": status_type,
            "input_octets": 10,
            "input_gigawords": 1,
            "output_octets": 20,
            "terminate_cause": "Admin-Reset"
        }))
        .unwrap()
    }

    #[test]
    fn test_accounting_into_event() {
        let event = accounting("Interim-Update").into_event().unwrap();
        assert_eq!(event.status_type, AccountingStatusType::InterimUpdate);
        assert_eq!(event.counters.rx_bytes, Some((1 << 32) | 10));
        assert_eq!(event.counters.tx_bytes, Some(20));
        assert_eq!(event.counters.session_time, None);
        assert_eq!(event.terminate_cause, Some(TerminateCause::AdminReset));
    }

    #[test]
    fn test_accounting_rejects_unknown_status() {
        let err = accounting("accounting-on").into_event().unwrap_err();
        assert!(err.is(ErrorKind::InvalidStatusType));
    }

    #[test]
    fn test_control_target() {
        let mut req = ControlActionRequest {
            session_id: Some("s1".into()),
            user_id: None,
            action: ControlAction::Disconnect,
            attributes: None,
            batch_size: None,
        };
        assert_eq!(req.target().unwrap(), ControlTarget::Session("s1".into()));
        req.user_id = Some("alice".into());
        assert!(req.target().is_err());
        req.session_id = None;
        assert_eq!(req.target().unwrap(), ControlTarget::User("alice".into()));
    }
}
