//! Quota enforcement engine.
//!
//! Enforcement is optimistic: on the first breach the disconnect is queued
//! and the session is marked `expired` immediately, before the NAS confirms.
//! Later breaches find the outstanding request and do nothing, so a session
//! crossing its quota repeatedly yields exactly one disconnect.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use accessgate_core::result::AppResult;
use accessgate_database::store::SessionStore;
use accessgate_entity::control::{
    ControlAttributes, ControlRequest, ControlRequestType, EnqueueOutcome, QuotaKind,
};
use accessgate_entity::profile::{AccessProfile, UserAccess};
use accessgate_entity::session::{RadiusSession, TerminateCause};

use crate::control::ControlDispatchQueue;

/// A limit that was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaBreach {
    /// Which limit.
    pub kind: QuotaKind,
    /// Usage in the limit's unit.
    pub used: i64,
    /// The limit.
    pub quota: i64,
}

/// Result of evaluating usage against a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum QuotaDecision {
    Within,
    Breach(QuotaBreach),
}

impl QuotaDecision {
    /// Compare usage against the profile's limits. Reaching a limit counts
    /// as a breach; when both are reached the data limit is reported.
    pub fn evaluate(profile: &AccessProfile, usage: &UserAccess) -> Self {
        if profile.is_unlimited() {
            return Self::Within;
        }
        if let Some(quota) = profile.quota_data_mb.filter(|&q| usage.quota_used_mb >= q) {
            return Self::Breach(QuotaBreach {
                kind: QuotaKind::Data,
                used: usage.quota_used_mb,
                quota,
            });
        }
        if let Some(quota) = profile.quota_time_minutes.filter(|&q| usage.minutes_used >= q) {
            return Self::Breach(QuotaBreach {
                kind: QuotaKind::Time,
                used: usage.minutes_used,
                quota,
            });
        }
        Self::Within
    }
}

/// What enforcement did.
#[derive(Debug, Clone)]
pub enum Enforcement {
    /// No limit reached.
    Within,
    /// First breach: a disconnect was queued and the session expired.
    DisconnectQueued {
        breach: QuotaBreach,
        request: ControlRequest,
    },
    /// A disconnect was already outstanding; nothing changed.
    AlreadyQueued {
        breach: QuotaBreach,
        request: ControlRequest,
    },
}

/// Turns quota breaches into disconnect requests.
#[derive(Clone)]
pub struct QuotaEnforcer {
    sessions: Arc<dyn SessionStore>,
    queue: Arc<ControlDispatchQueue>,
}

impl QuotaEnforcer {
    /// Create a new enforcer.
    pub fn new(sessions: Arc<dyn SessionStore>, queue: Arc<ControlDispatchQueue>) -> Self {
        Self { sessions, queue }
    }

    /// Evaluate and, on breach, queue a guarded disconnect.
    pub async fn enforce(
        &self,
        session: &RadiusSession,
        profile: &AccessProfile,
        usage: &UserAccess,
    ) -> AppResult<Enforcement> {
        let QuotaDecision::Breach(breach) = QuotaDecision::evaluate(profile, usage) else {
            return Ok(Enforcement::Within);
        };

        let attributes = ControlAttributes::QuotaExceeded {
            limit: breach.kind,
            used: breach.used,
            quota: breach.quota,
        };
        let outcome = self
            .queue
            .enqueue_for(session, ControlRequestType::Disconnect, attributes, None)
            .await?;

        match outcome {
            EnqueueOutcome::Created(request) => {
                let expired = self
                    .sessions
                    .mark_expired(&session.session_id, &TerminateCause::QuotaExceeded, Utc::now())
                    .await?;
                if !expired {
                    warn!(
                        session_id = %session.session_id,
                        "Session ended before quota expiry could be recorded"
                    );
                }
                info!(
                    session_id = %session.session_id,
                    user_id = %session.user_id,
                    limit = ?breach.kind,
                    used = breach.used,
                    quota = breach.quota,
                    request_id = %request.id,
                    "Quota exceeded, disconnect queued"
                );
                Ok(Enforcement::DisconnectQueued { breach, request })
            }
            EnqueueOutcome::Existing(request) => Ok(Enforcement::AlreadyQueued { breach, request }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_core::types::ProfileId;

    fn profile(data: Option<i64>, time: Option<i64>) -> AccessProfile {
        AccessProfile {
            id: ProfileId::new(),
            name: "p".into(),
            quota_data_mb: data,
            quota_time_minutes: time,
            bandwidth_up_kbps: None,
            bandwidth_down_kbps: None,
        }
    }

    fn usage(mb: i64, minutes: i64) -> UserAccess {
        UserAccess {
            user_id: "u".into(),
            profile_id: ProfileId::new(),
            quota_used_mb: mb,
            minutes_used: minutes,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_reaching_limit_is_breach() {
        let decision = QuotaDecision::evaluate(&profile(Some(500), None), &usage(500, 0));
        assert_eq!(
            decision,
            QuotaDecision::Breach(QuotaBreach {
                kind: QuotaKind::Data,
                used: 500,
                quota: 500
            })
        );
        assert_eq!(
            QuotaDecision::evaluate(&profile(Some(500), None), &usage(499, 10_000)),
            QuotaDecision::Within
        );
    }

    #[test]
    fn test_time_limit_and_unlimited() {
        let decision = QuotaDecision::evaluate(&profile(None, Some(60)), &usage(9_999, 61));
        assert!(matches!(
            decision,
            QuotaDecision::Breach(QuotaBreach {
                kind: QuotaKind::Time,
                ..
            })
        ));
        assert_eq!(
            QuotaDecision::evaluate(&profile(None, None), &usage(i64::MAX, i64::MAX)),
            QuotaDecision::Within
        );
    }

    #[test]
    fn test_data_reported_when_both_reached() {
        let decision = QuotaDecision::evaluate(&profile(Some(1), Some(1)), &usage(2, 2));
        assert!(matches!(
            decision,
            QuotaDecision::Breach(QuotaBreach {
                kind: QuotaKind::Data,
                ..
            })
        ));
    }
}
