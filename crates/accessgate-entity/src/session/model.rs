//! RADIUS session entity model.

use accessgate_core::types::ProfileId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::counters::CounterUpdate;
use crate::accounting::NasMeta;
use super::state::SessionState;
use super::terminate_cause::TerminateCause;

const BYTES_PER_MB: i64 = 1_048_576;

/// A network access session as seen by the NAS.
///
/// Created in [`SessionState::Authorized`] by the authorization hand-off and
/// mutated by accounting. Counters only ever move forward.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RadiusSession {
    /// NAS-supplied `Acct-Session-Id`; unique and immutable.
    pub session_id: String,
    /// Subscriber this session belongs to.
    pub user_id: String,
    /// Access profile bound at authorization.
    pub profile_id: ProfileId,
    /// Address of the NAS that owns the session.
    pub nas_ip_address: String,
    /// NAS port identifier.
    pub nas_port_id: Option<String>,
    /// Calling-station MAC address.
    pub mac_address: Option<String>,
    /// Access point name reported by the NAS.
    pub ap_name: Option<String>,
    /// SSID the client associated with.
    pub ssid: Option<String>,
    /// Lifecycle state.
    pub state: SessionState,
    /// When accounting started.
    pub start_time: Option<DateTime<Utc>>,
    /// Last accounting event received.
    pub last_seen: Option<DateTime<Utc>>,
    /// When the session ended.
    pub stop_time: Option<DateTime<Utc>>,
    /// Cumulative session time in seconds.
    pub session_time: i64,
    /// Cumulative bytes received by the subscriber.
    pub rx_bytes: i64,
    /// Cumulative bytes sent by the subscriber.
    pub tx_bytes: i64,
    /// Cumulative packets received.
    pub rx_packets: i64,
    /// Cumulative packets sent.
    pub tx_packets: i64,
    /// Stored terminate cause, see [`RadiusSession::terminate_cause`].
    #[sqlx(rename = "terminate_cause")]
    #[serde(rename = "terminate_cause")]
    pub terminate_cause_raw: Option<String>,
    /// When the session record was created.
    pub created_at: DateTime<Utc>,
}

impl RadiusSession {
    /// Build a freshly authorized session.
    pub fn authorized(new: NewSession, now: DateTime<Utc>) -> Self {
        Self {
            session_id: new.session_id,
            user_id: new.user_id,
            profile_id: new.profile_id,
            nas_ip_address: new.nas_ip_address,
            nas_port_id: new.nas_port_id,
            mac_address: new.mac_address,
            ap_name: None,
            ssid: None,
            state: SessionState::Authorized,
            start_time: None,
            last_seen: None,
            stop_time: None,
            session_time: 0,
            rx_bytes: 0,
            tx_bytes: 0,
            rx_packets: 0,
            tx_packets: 0,
            terminate_cause_raw: None,
            created_at: now,
        }
    }

    /// Check whether the session has ended.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Parsed terminate cause.
    pub fn terminate_cause(&self) -> Option<TerminateCause> {
        self.terminate_cause_raw.as_deref().map(TerminateCause::parse)
    }

    /// Set the terminate cause.
    pub fn set_terminate_cause(&mut self, cause: &TerminateCause) {
        self.terminate_cause_raw = Some(cause.as_str().to_string());
    }

    /// Merge reported counters, keeping each field monotonic.
    ///
    /// A reported value lower than the stored one is ignored for that field
    /// only. Returns the names of the fields that regressed.
    pub fn apply_counters(&mut self, update: &CounterUpdate) -> Vec<&'static str> {
        let mut regressed = Vec::new();
        let fields: [(&'static str, Option<i64>, &mut i64); 5] = [
            ("session_time", update.session_time, &mut self.session_time),
            ("rx_bytes", update.rx_bytes, &mut self.rx_bytes),
            ("tx_bytes", update.tx_bytes, &mut self.tx_bytes),
            ("rx_packets", update.rx_packets, &mut self.rx_packets),
            ("tx_packets", update.tx_packets, &mut self.tx_packets),
        ];
        for (name, reported, stored) in fields {
            match reported {
                Some(value) if value >= *stored => *stored = value,
                Some(_) => regressed.push(name),
                None => {}
            }
        }
        regressed
    }

    /// Apply an accounting start: the session becomes active.
    pub fn record_start(&mut self, meta: &NasMeta, at: DateTime<Utc>) {
        self.state = SessionState::Active;
        self.start_time = Some(at);
        self.last_seen = Some(at);
        self.refresh_meta(meta);
    }

    /// Apply an interim update. An authorized session is promoted to active.
    pub fn record_interim(
        &mut self,
        counters: &CounterUpdate,
        meta: &NasMeta,
        at: DateTime<Utc>,
    ) -> Vec<&'static str> {
        if self.state == SessionState::Authorized {
            self.state = SessionState::Active;
            self.start_time.get_or_insert(at);
        }
        self.last_seen = Some(at);
        self.refresh_meta(meta);
        self.apply_counters(counters)
    }

    /// Apply an accounting stop with its final counters.
    pub fn record_stop(
        &mut self,
        counters: &CounterUpdate,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> Vec<&'static str> {
        let regressed = self.apply_counters(counters);
        self.state = SessionState::Stopped;
        self.stop_time = Some(at);
        self.last_seen = Some(at);
        self.set_terminate_cause(cause);
        regressed
    }

    /// End the session locally, ahead of NAS confirmation.
    pub fn expire(&mut self, cause: &TerminateCause, at: DateTime<Utc>) {
        self.state = SessionState::Expired;
        self.stop_time = Some(at);
        self.set_terminate_cause(cause);
    }

    /// Record an acknowledged disconnect. Keeps an earlier `stop_time`.
    pub fn finalize_stopped(&mut self, cause: &TerminateCause, at: DateTime<Utc>) {
        self.state = SessionState::Stopped;
        self.stop_time.get_or_insert(at);
        self.set_terminate_cause(cause);
    }

    fn refresh_meta(&mut self, meta: &NasMeta) {
        if let Some(port) = &meta.nas_port_id {
            self.nas_port_id = Some(port.clone());
        }
        if let Some(mac) = &meta.mac_address {
            self.mac_address = Some(mac.clone());
        }
        if let Some(ap) = &meta.ap_name {
            self.ap_name = Some(ap.clone());
        }
        if let Some(ssid) = &meta.ssid {
            self.ssid = Some(ssid.clone());
        }
    }

    /// Derived usage totals.
    pub fn usage(&self) -> SessionUsage {
        SessionUsage::from_counters(self.rx_bytes, self.tx_bytes, self.session_time)
    }
}

/// Usage derived from a session's counters, in quota units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUsage {
    /// `round((rx + tx) / 1 MiB)`.
    pub total_mb: i64,
    /// `round(session_time / 60)`.
    pub total_minutes: i64,
}

impl SessionUsage {
    /// Derive totals, rounding half up.
    pub fn from_counters(rx_bytes: i64, tx_bytes: i64, session_time: i64) -> Self {
        let bytes = rx_bytes.saturating_add(tx_bytes).max(0);
        Self {
            total_mb: bytes.saturating_add(BYTES_PER_MB / 2) / BYTES_PER_MB,
            total_minutes: session_time.max(0).saturating_add(30) / 60,
        }
    }
}

/// Data required to register an authorized session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSession {
    /// NAS-supplied session identifier.
    pub session_id: String,
    /// Subscriber.
    pub user_id: String,
    /// Bound access profile.
    pub profile_id: ProfileId,
    /// NAS address.
    pub nas_ip_address: String,
    /// NAS port identifier.
    pub nas_port_id: Option<String>,
    /// Calling-station MAC address.
    pub mac_address: Option<String>,
}
