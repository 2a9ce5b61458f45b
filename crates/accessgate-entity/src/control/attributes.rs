//! Typed control request attributes.

use serde::{Deserialize, Serialize};

use super::status::ControlRequestType;
use crate::session::TerminateCause;

/// Which quota limit was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaKind {
    /// Data quota in megabytes.
    Data,
    /// Time quota in minutes.
    Time,
}

/// Why a control request was issued, plus reason-specific parameters.
///
/// Stored as JSON with a `reason` discriminator, e.g.
/// `{"reason":"quota_exceeded","limit":"data","used":550,"quota":500}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ControlAttributes {
    /// Issued by quota enforcement.
    QuotaExceeded {
        /// Limit that was hit.
        limit: QuotaKind,
        /// Usage at the time of the breach, in the limit's unit.
        used: i64,
        /// Configured quota, in the limit's unit.
        quota: i64,
    },
    /// Operator-initiated disconnect.
    AdminDisconnect {
        /// Who asked for it.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operator: Option<String>,
    },
    /// Operator-initiated change of authorization.
    AdminReauthorize {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bandwidth_up_kbps: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bandwidth_down_kbps: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_timeout_seconds: Option<i64>,
    },
    /// Vendor-specific attribute passed through to the adapter.
    Custom {
        key: String,
        value: serde_json::Value,
    },
}

impl ControlAttributes {
    /// The `reason` tag.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::AdminDisconnect { .. } => "admin_disconnect",
            Self::AdminReauthorize { .. } => "admin_reauthorize",
            Self::Custom { .. } => "custom",
        }
    }

    /// Default attributes for an operator action.
    pub fn admin(request_type: ControlRequestType) -> Self {
        match request_type {
            ControlRequestType::Disconnect => Self::AdminDisconnect { operator: None },
            ControlRequestType::Reauthorize => Self::AdminReauthorize {
                bandwidth_up_kbps: None,
                bandwidth_down_kbps: None,
                session_timeout_seconds: None,
            },
        }
    }

    /// Check whether these attributes make sense for the request type.
    pub fn fits(&self, request_type: ControlRequestType) -> bool {
        match self {
            Self::QuotaExceeded { .. } | Self::AdminDisconnect { .. } => {
                request_type == ControlRequestType::Disconnect
            }
            Self::AdminReauthorize { .. } => request_type == ControlRequestType::Reauthorize,
            Self::Custom { .. } => true,
        }
    }

    /// Terminate cause recorded when a disconnect with these attributes is acknowledged.
    pub fn terminate_cause(&self) -> TerminateCause {
        match self {
            Self::QuotaExceeded { .. } => TerminateCause::QuotaExceeded,
            _ => TerminateCause::AdminDisconnect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialized_with_reason_tag() {
        let attrs = ControlAttributes::QuotaExceeded {
            limit: QuotaKind::Data,
            used: 550,
            quota: 500,
        };
        let json = serde_json::to_value(&attrs).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"reason": "quota_exceeded", "limit": "data", "used": 550, "quota": 500})
        );
    }

    #[test]
    fn test_admin_disconnect_accepts_bare_reason() {
        let attrs: ControlAttributes =
            serde_json::from_str(r#"{"reason":"admin_disconnect"}"#).expect("deserialize");
        assert_eq!(attrs, ControlAttributes::AdminDisconnect { operator: None });
        assert_eq!(attrs.terminate_cause(), TerminateCause::AdminDisconnect);
    }

    #[test]
    fn test_fits_request_type() {
        let reauth = ControlAttributes::admin(ControlRequestType::Reauthorize);
        assert!(reauth.fits(ControlRequestType::Reauthorize));
        assert!(!reauth.fits(ControlRequestType::Disconnect));
        let custom = ControlAttributes::Custom {
            key: "Mikrotik-Rate-Limit".into(),
            value: serde_json::json!("1M/2M"),
        };
        assert!(custom.fits(ControlRequestType::Disconnect));
    }
}
