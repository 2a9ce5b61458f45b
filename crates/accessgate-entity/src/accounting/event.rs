//! Accounting event received from a NAS.

use accessgate_core::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::session::{CounterUpdate, TerminateCause};

/// RADIUS `Acct-Status-Type` values AccessGate acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountingStatusType {
    Start,
    InterimUpdate,
    Stop,
}

impl AccountingStatusType {
    /// Return the wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::InterimUpdate => "interim-update",
            Self::Stop => "stop",
        }
    }
}

impl fmt::Display for AccountingStatusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountingStatusType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "start" => Ok(Self::Start),
            "interim-update" => Ok(Self::InterimUpdate),
            "stop" => Ok(Self::Stop),
            _ => Err(AppError::invalid_status_type(s)),
        }
    }
}

/// NAS-side attributes carried by accounting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NasMeta {
    pub nas_ip_address: Option<String>,
    pub nas_port_id: Option<String>,
    pub mac_address: Option<String>,
    pub ap_name: Option<String>,
    pub ssid: Option<String>,
}

/// One accounting event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingEvent {
    /// `Acct-Session-Id`.
    pub session_id: String,
    /// `User-Name` as reported by the NAS.
    pub username: Option<String>,
    /// Event kind.
    pub status_type: AccountingStatusType,
    /// Reported counters.
    pub counters: CounterUpdate,
    /// NAS metadata.
    pub nas: NasMeta,
    /// `Acct-Terminate-Cause`, for stop events.
    pub terminate_cause: Option<TerminateCause>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_core::ErrorKind;

    #[test]
    fn test_status_type_accepts_radius_spellings() {
        assert_eq!(
            "Interim-Update".parse::<AccountingStatusType>().expect("parse"),
            AccountingStatusType::InterimUpdate
        );
        assert_eq!(
            "interim_update".parse::<AccountingStatusType>().expect("parse"),
            AccountingStatusType::InterimUpdate
        );
        assert_eq!(
            "Stop".parse::<AccountingStatusType>().expect("parse"),
            AccountingStatusType::Stop
        );
    }

    #[test]
    fn test_unknown_status_type_is_rejected() {
        let err = "accounting-on".parse::<AccountingStatusType>().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidStatusType);
    }
}
