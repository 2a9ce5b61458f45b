//! Connection method tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use accessgate_core::AppError;

/// How AccessGate reaches a NAS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionMethod {
    /// In-process simulation.
    Simulated,
    /// Generic HTTP bridge.
    Http,
    Mikrotik,
    Ubiquiti,
    Openwisp,
    Wireguard,
    Tailscale,
    CloudflareTunnel,
    /// RADIUS Disconnect/CoA straight to the NAS.
    Direct,
}

impl ConnectionMethod {
    /// Every known method.
    pub const ALL: [ConnectionMethod; 9] = [
        Self::Simulated,
        Self::Http,
        Self::Mikrotik,
        Self::Ubiquiti,
        Self::Openwisp,
        Self::Wireguard,
        Self::Tailscale,
        Self::CloudflareTunnel,
        Self::Direct,
    ];

    /// Return the method tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simulated => "simulated",
            Self::Http => "http",
            Self::Mikrotik => "mikrotik",
            Self::Ubiquiti => "ubiquiti",
            Self::Openwisp => "openwisp",
            Self::Wireguard => "wireguard",
            Self::Tailscale => "tailscale",
            Self::CloudflareTunnel => "cloudflare_tunnel",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| AppError::configuration(format!("Unknown connection method '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_dashes_and_case() {
        assert_eq!(
            "Cloudflare-Tunnel".parse::<ConnectionMethod>().expect("parse"),
            ConnectionMethod::CloudflareTunnel
        );
        assert!("carrier-pigeon".parse::<ConnectionMethod>().is_err());
    }
}
