//! Control request type and status enumerations.

use accessgate_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of command sent to the NAS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "control_request_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ControlRequestType {
    /// RADIUS Disconnect-Request.
    Disconnect,
    /// RADIUS CoA-Request re-authorizing the session.
    Reauthorize,
}

impl ControlRequestType {
    /// Return the type as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnect => "disconnect",
            Self::Reauthorize => "reauthorize",
        }
    }
}

impl fmt::Display for ControlRequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery status of a control request.
///
/// Moves strictly `pending → sent → {ack, nak}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "control_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ControlStatus {
    /// Queued, not yet claimed.
    Pending,
    /// Claimed by a drain; adapter call in flight.
    Sent,
    /// NAS acknowledged.
    Ack,
    /// NAS rejected, timed out, or the call failed.
    Nak,
}

impl ControlStatus {
    /// Check if the request is resolved.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ack | Self::Nak)
    }

    /// Check if the request blocks another of the same type for its session.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, Self::Pending | Self::Sent)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Ack => "ack",
            Self::Nak => "nak",
        }
    }
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ControlStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "ack" => Ok(Self::Ack),
            "nak" => Ok(Self::Nak),
            _ => Err(AppError::invalid_request(format!(
                "Unknown control status '{s}'"
            ))),
        }
    }
}
