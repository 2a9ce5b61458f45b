//! Session termination causes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a session ended.
///
/// Accepts both the snake_case form used internally and the RADIUS
/// `Acct-Terminate-Cause` spelling (`User-Request`, `Lost-Carrier`, ...).
/// Values outside the known set are kept verbatim in [`TerminateCause::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TerminateCause {
    #[default]
    UserRequest,
    LostCarrier,
    IdleTimeout,
    SessionTimeout,
    AdminReset,
    AdminDisconnect,
    QuotaExceeded,
    NasReboot,
    /// Expired by the stale-session reaper.
    Stale,
    Other(String),
}

impl TerminateCause {
    /// Canonical snake_case representation, as stored.
    pub fn as_str(&self) -> &str {
        match self {
            Self::UserRequest => "user_request",
            Self::LostCarrier => "lost_carrier",
            Self::IdleTimeout => "idle_timeout",
            Self::SessionTimeout => "session_timeout",
            Self::AdminReset => "admin_reset",
            Self::AdminDisconnect => "admin_disconnect",
            Self::QuotaExceeded => "quota_exceeded",
            Self::NasReboot => "nas_reboot",
            Self::Stale => "stale",
            Self::Other(raw) => raw,
        }
    }

    /// Parse a stored or NAS-reported cause.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "user_request" => Self::UserRequest,
            "lost_carrier" => Self::LostCarrier,
            "idle_timeout" => Self::IdleTimeout,
            "session_timeout" => Self::SessionTimeout,
            "admin_reset" => Self::AdminReset,
            "admin_disconnect" => Self::AdminDisconnect,
            "quota_exceeded" => Self::QuotaExceeded,
            "nas_reboot" => Self::NasReboot,
            "stale" => Self::Stale,
            _ => Self::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for TerminateCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for TerminateCause {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TerminateCause> for String {
    fn from(cause: TerminateCause) -> Self {
        cause.as_str().to_string()
    }
}
