//! Session lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a RADIUS session.
///
/// `authorized → active → {stopped, expired}`; `stopped` and `expired` are
/// terminal. The one permitted move out of a terminal state is
/// `expired → stopped` when a queued disconnect is acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "session_state", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Pre-created by the authorization step; no accounting seen yet.
    Authorized,
    /// Accounting has started.
    Active,
    /// Ended by an accounting stop or an acknowledged disconnect.
    Stopped,
    /// Ended locally by quota enforcement or the stale-session reaper.
    Expired,
}

impl SessionState {
    /// Check if the session no longer accepts accounting.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Expired)
    }

    /// Return the state as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Active => "active",
            Self::Stopped => "stopped",
            Self::Expired => "expired",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authorized" => Ok(Self::Authorized),
            "active" => Ok(Self::Active),
            "stopped" => Ok(Self::Stopped),
            "expired" => Ok(Self::Expired),
            other => Err(format!("unknown session state '{other}'")),
        }
    }
}
