//! Applies start / interim-update / stop events to sessions.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use accessgate_core::error::AppError;
use accessgate_core::result::AppResult;
use accessgate_database::store::{SessionStore, SessionWrite};
use accessgate_entity::accounting::{AccountingEvent, AccountingStatusType};
use accessgate_entity::session::{RadiusSession, SessionState, TerminateCause};

use crate::policy::PolicyResolver;
use crate::quota::{Enforcement, QuotaEnforcer};

/// Result of applying one accounting event.
#[derive(Debug, Clone)]
pub enum AccountingOutcome {
    /// The event changed the session.
    Applied {
        session: RadiusSession,
        /// Quota enforcement result, for interim updates.
        enforcement: Option<Enforcement>,
    },
    /// The session was already terminal; nothing changed.
    Ignored {
        session_id: String,
        state: SessionState,
    },
}

impl AccountingOutcome {
    /// Human-readable summary returned to the NAS.
    pub fn message(&self) -> String {
        match self {
            Self::Applied {
                enforcement: Some(Enforcement::DisconnectQueued { breach, .. }),
                ..
            } => format!(
                "Accounting applied; quota exceeded ({:?} {}/{}), disconnect queued",
                breach.kind, breach.used, breach.quota
            ),
            Self::Applied { .. } => "Accounting applied".to_string(),
            Self::Ignored { session_id, state } => {
                format!("Session '{session_id}' is {state}; event ignored")
            }
        }
    }
}

/// Accounting ingestion engine.
#[derive(Clone)]
pub struct AccountingEngine {
    sessions: Arc<dyn SessionStore>,
    policy: Arc<PolicyResolver>,
    enforcer: Arc<QuotaEnforcer>,
}

impl AccountingEngine {
    /// Create a new engine.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        policy: Arc<PolicyResolver>,
        enforcer: Arc<QuotaEnforcer>,
    ) -> Self {
        Self {
            sessions,
            policy,
            enforcer,
        }
    }

    /// Apply one event. Unknown sessions are an error; sessions are never
    /// created from accounting.
    pub async fn apply(&self, event: AccountingEvent) -> AppResult<AccountingOutcome> {
        let now = Utc::now();
        let session_id = event.session_id.as_str();

        let write = match event.status_type {
            AccountingStatusType::Start => {
                self.sessions
                    .record_start(session_id, &event.nas, now)
                    .await?
            }
            AccountingStatusType::InterimUpdate => {
                self.sessions
                    .record_interim(session_id, &event.counters, &event.nas, now)
                    .await?
            }
            AccountingStatusType::Stop => {
                let cause = event.terminate_cause.clone().unwrap_or_default();
                self.sessions
                    .record_stop(session_id, &event.counters, &cause, now)
                    .await?
            }
        };

        let (session, usage, regressed) = match write {
            SessionWrite::NotFound => return Err(AppError::session_not_found(session_id)),
            SessionWrite::Terminal(session) => {
                info!(
                    session_id,
                    state = %session.state,
                    status_type = %event.status_type,
                    "Accounting for terminal session ignored"
                );
                return Ok(AccountingOutcome::Ignored {
                    session_id: session.session_id,
                    state: session.state,
                });
            }
            SessionWrite::Applied {
                session,
                usage,
                regressed,
            } => (session, usage, regressed),
        };

        if let Some(username) = event
            .username
            .as_deref()
            .filter(|name| *name != session.user_id)
        {
            warn!(
                session_id,
                reported = username,
                user_id = %session.user_id,
                "Accounting username does not match session user"
            );
        }
        if !regressed.is_empty() {
            warn!(
                session_id,
                fields = ?regressed,
                "Ignored counters lower than stored values"
            );
        }

        debug!(
            session_id,
            status_type = %event.status_type,
            state = %session.state,
            rx_bytes = session.rx_bytes,
            tx_bytes = session.tx_bytes,
            session_time = session.session_time,
            "Accounting applied"
        );

        if event.status_type != AccountingStatusType::InterimUpdate {
            if event.status_type == AccountingStatusType::Stop {
                info!(
                    session_id,
                    terminate_cause = %session.terminate_cause().unwrap_or(TerminateCause::UserRequest),
                    "Session stopped"
                );
            }
            return Ok(AccountingOutcome::Applied {
                session,
                enforcement: None,
            });
        }

        let Some(usage) = usage else {
            return Ok(AccountingOutcome::Applied {
                session,
                enforcement: None,
            });
        };
        let Some(profile) = self.policy.find(session.profile_id).await? else {
            warn!(
                session_id,
                profile_id = %session.profile_id,
                "Session profile not found, quota not enforced"
            );
            return Ok(AccountingOutcome::Applied {
                session,
                enforcement: None,
            });
        };

        let enforcement = self.enforcer.enforce(&session, &profile, &usage).await?;
        let session = match enforcement {
            Enforcement::DisconnectQueued { .. } => self
                .sessions
                .find_session(session_id)
                .await?
                .unwrap_or(session),
            _ => session,
        };

        Ok(AccountingOutcome::Applied {
            session,
            enforcement: Some(enforcement),
        })
    }
}
