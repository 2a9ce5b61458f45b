//! Session service: registration hand-off from the authorization step,
//! detail queries, and the stale-session reaper.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use accessgate_core::error::{AppError, ErrorKind};
use accessgate_core::result::AppResult;
use accessgate_database::store::SessionStore;
use accessgate_entity::profile::{AccessProfile, UserAccess};
use accessgate_entity::session::{NewSession, RadiusSession, SessionUsage, TerminateCause};

use crate::policy::PolicyResolver;

/// A session with its derived usage and policy.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: RadiusSession,
    /// Usage derived from this session's own counters.
    pub usage: SessionUsage,
    pub profile: Option<AccessProfile>,
    /// Accumulated usage for the (user, profile) pair.
    pub user_access: Option<UserAccess>,
}

/// Session lifecycle operations outside accounting.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionStore>,
    policy: Arc<PolicyResolver>,
}

impl SessionService {
    /// Create a new session service.
    pub fn new(sessions: Arc<dyn SessionStore>, policy: Arc<PolicyResolver>) -> Self {
        Self { sessions, policy }
    }

    /// Pre-create a session in `authorized`.
    pub async fn register(&self, new: NewSession) -> AppResult<RadiusSession> {
        for (field, value) in [
            ("session_id", &new.session_id),
            ("user_id", &new.user_id),
            ("nas_ip_address", &new.nas_ip_address),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::invalid_request(format!("{field} is required")));
            }
        }
        self.policy.resolve(new.profile_id).await.map_err(|e| {
            if e.is(ErrorKind::NotFound) {
                AppError::invalid_request(e.message)
            } else {
                e
            }
        })?;

        let session = self.sessions.register_session(new).await?;
        info!(
            session_id = %session.session_id,
            user_id = %session.user_id,
            profile_id = %session.profile_id,
            nas_ip = %session.nas_ip_address,
            "Session authorized"
        );
        Ok(session)
    }

    /// Load a session with its usage and profile.
    pub async fn detail(&self, session_id: &str) -> AppResult<SessionDetail> {
        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or_else(|| AppError::session_not_found(session_id))?;
        let profile = self.policy.find(session.profile_id).await?;
        let user_access = self
            .sessions
            .find_user_access(&session.user_id, session.profile_id)
            .await?;
        Ok(SessionDetail {
            usage: session.usage(),
            session,
            profile,
            user_access,
        })
    }

    /// Expire non-terminal sessions with no accounting for `stale_after`.
    pub async fn reap_stale(&self, stale_after: Duration) -> AppResult<Vec<String>> {
        let age = chrono::Duration::from_std(stale_after)
            .map_err(|e| AppError::invalid_request(format!("Invalid stale age: {e}")))?;
        let now = Utc::now();
        let expired = self
            .sessions
            .expire_stale(now - age, &TerminateCause::Stale, now)
            .await?;
        if !expired.is_empty() {
            info!(count = expired.len(), "Expired stale sessions");
        }
        Ok(expired)
    }

    /// Check the session store.
    pub async fn health(&self) -> AppResult<bool> {
        self.sessions.health_check().await
    }
}
