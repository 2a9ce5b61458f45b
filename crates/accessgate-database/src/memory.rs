//! In-memory store using a Tokio mutex for single-node deployments.
//!
//! One mutex guards every table, so each operation is trivially atomic.
//! State is lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use accessgate_core::error::AppError;
use accessgate_core::result::AppResult;
use accessgate_core::types::{ControlRequestId, NasDeviceId, ProfileId};
use accessgate_entity::accounting::NasMeta;
use accessgate_entity::control::{
    ControlQueueStats, ControlRequest, ControlStatus, EnqueueOutcome, NewControlRequest,
};
use accessgate_entity::nas::NasDevice;
use accessgate_entity::profile::{AccessProfile, UserAccess};
use accessgate_entity::session::{
    CounterUpdate, NewSession, RadiusSession, SessionState, TerminateCause,
};

use crate::store::{
    ControlRequestStore, NasDeviceStore, ProfileStore, SessionStore, SessionWrite,
};

#[derive(Debug, Default)]
struct InnerState {
    sessions: HashMap<String, RadiusSession>,
    profiles: HashMap<ProfileId, AccessProfile>,
    usage: HashMap<(String, ProfileId), UserAccess>,
    /// Insertion order is creation order.
    requests: Vec<ControlRequest>,
    devices: HashMap<String, NasDevice>,
}

impl InnerState {
    fn upsert_usage(&mut self, session: &RadiusSession, at: DateTime<Utc>) -> UserAccess {
        let totals = session.usage();
        let row = UserAccess {
            user_id: session.user_id.clone(),
            profile_id: session.profile_id,
            quota_used_mb: totals.total_mb,
            minutes_used: totals.total_minutes,
            updated_at: at,
        };
        self.usage
            .insert((row.user_id.clone(), row.profile_id), row.clone());
        row
    }

    fn write<F>(&mut self, session_id: &str, at: DateTime<Utc>, with_usage: bool, apply: F) -> SessionWrite
    where
        F: FnOnce(&mut RadiusSession) -> Vec<&'static str>,
    {
        let Some(session) = self.sessions.get_mut(session_id) else {
            return SessionWrite::NotFound;
        };
        if session.is_terminal() {
            return SessionWrite::Terminal(session.clone());
        }
        let regressed = apply(session);
        let session = session.clone();
        let usage = with_usage.then(|| self.upsert_usage(&session, at));
        SessionWrite::Applied {
            session,
            usage,
            regressed,
        }
    }
}

/// Process-local implementation of every store contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<InnerState>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an access profile.
    pub async fn insert_profile(&self, profile: AccessProfile) {
        self.state.lock().await.profiles.insert(profile.id, profile);
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_session(&self, session_id: &str) -> AppResult<Option<RadiusSession>> {
        Ok(self.state.lock().await.sessions.get(session_id).cloned())
    }

    async fn register_session(&self, new: NewSession) -> AppResult<RadiusSession> {
        let mut state = self.state.lock().await;
        if state.sessions.contains_key(&new.session_id) {
            return Err(AppError::conflict(format!(
                "Session '{}' already exists",
                new.session_id
            )));
        }
        if !state.profiles.contains_key(&new.profile_id) {
            return Err(AppError::invalid_request(format!(
                "Unknown profile '{}'",
                new.profile_id
            )));
        }
        let session = RadiusSession::authorized(new, Utc::now());
        state
            .sessions
            .insert(session.session_id.clone(), session.clone());
        Ok(session)
    }

    async fn record_start(
        &self,
        session_id: &str,
        meta: &NasMeta,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite> {
        let mut state = self.state.lock().await;
        Ok(state.write(session_id, at, false, |session| {
            session.record_start(meta, at);
            Vec::new()
        }))
    }

    async fn record_interim(
        &self,
        session_id: &str,
        counters: &CounterUpdate,
        meta: &NasMeta,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite> {
        let mut state = self.state.lock().await;
        Ok(state.write(session_id, at, !counters.is_empty(), |session| {
            session.record_interim(counters, meta, at)
        }))
    }

    async fn record_stop(
        &self,
        session_id: &str,
        counters: &CounterUpdate,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite> {
        let mut state = self.state.lock().await;
        Ok(state.write(session_id, at, !counters.is_empty(), |session| {
            session.record_stop(counters, cause, at)
        }))
    }

    async fn mark_expired(
        &self,
        session_id: &str,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(session_id) {
            Some(session) if !session.is_terminal() => {
                session.expire(cause, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn finalize_disconnect(
        &self,
        session_id: &str,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(session_id) {
            Some(session) if session.state != SessionState::Stopped => {
                session.finalize_stopped(cause, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn find_open_sessions_by_user(&self, user_id: &str) -> AppResult<Vec<RadiusSession>> {
        let state = self.state.lock().await;
        let mut open: Vec<RadiusSession> = state
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && !s.is_terminal())
            .cloned()
            .collect();
        open.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        Ok(open)
    }

    async fn expire_stale(
        &self,
        before: DateTime<Utc>,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        let mut state = self.state.lock().await;
        let mut expired = Vec::new();
        for session in state.sessions.values_mut() {
            let seen = session.last_seen.unwrap_or(session.created_at);
            if !session.is_terminal() && seen < before {
                session.expire(cause, at);
                expired.push(session.session_id.clone());
            }
        }
        expired.sort();
        Ok(expired)
    }

    async fn find_user_access(
        &self,
        user_id: &str,
        profile_id: ProfileId,
    ) -> AppResult<Option<UserAccess>> {
        let state = self.state.lock().await;
        Ok(state.usage.get(&(user_id.to_string(), profile_id)).cloned())
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn find_profile(&self, id: ProfileId) -> AppResult<Option<AccessProfile>> {
        Ok(self.state.lock().await.profiles.get(&id).cloned())
    }
}

#[async_trait]
impl ControlRequestStore for MemoryStore {
    async fn enqueue_guarded(&self, new: NewControlRequest) -> AppResult<EnqueueOutcome> {
        let mut state = self.state.lock().await;
        let outstanding = state.requests.iter().find(|r| {
            r.session_id == new.session_id
                && r.request_type == new.request_type
                && r.status.is_outstanding()
        });
        if let Some(existing) = outstanding {
            return Ok(EnqueueOutcome::Existing(existing.clone()));
        }
        let request = ControlRequest::pending(new, Utc::now());
        state.requests.push(request.clone());
        Ok(EnqueueOutcome::Created(request))
    }

    async fn claim_pending(&self, limit: u32) -> AppResult<Vec<ControlRequest>> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let claimed = state
            .requests
            .iter_mut()
            .filter(|r| r.status == ControlStatus::Pending)
            .take(limit as usize)
            .map(|r| {
                r.status = ControlStatus::Sent;
                r.sent_at = Some(now);
                r.clone()
            })
            .collect();
        Ok(claimed)
    }

    async fn resolve(
        &self,
        id: ControlRequestId,
        status: ControlStatus,
        response_code: Option<i32>,
        error_message: Option<&str>,
    ) -> AppResult<Option<ControlRequest>> {
        if !status.is_terminal() {
            return Err(AppError::internal(format!(
                "Cannot resolve control request to '{status}'"
            )));
        }
        let mut state = self.state.lock().await;
        let Some(request) = state
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == ControlStatus::Sent)
        else {
            return Ok(None);
        };
        request.status = status;
        request.response_code = response_code;
        request.error_message = error_message.map(str::to_string);
        request.response_at = Some(Utc::now());
        Ok(Some(request.clone()))
    }

    async fn sweep_stale_sent(
        &self,
        before: DateTime<Utc>,
        error_message: &str,
    ) -> AppResult<Vec<ControlRequest>> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let swept = state
            .requests
            .iter_mut()
            .filter(|r| r.status == ControlStatus::Sent && r.sent_at.is_some_and(|t| t < before))
            .map(|r| {
                r.status = ControlStatus::Nak;
                r.error_message = Some(error_message.to_string());
                r.response_at = Some(now);
                r.clone()
            })
            .collect();
        Ok(swept)
    }

    async fn find_by_id(&self, id: ControlRequestId) -> AppResult<Option<ControlRequest>> {
        let state = self.state.lock().await;
        Ok(state.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list(
        &self,
        status: Option<ControlStatus>,
        limit: u32,
    ) -> AppResult<Vec<ControlRequest>> {
        let state = self.state.lock().await;
        Ok(state
            .requests
            .iter()
            .rev()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> AppResult<ControlQueueStats> {
        let state = self.state.lock().await;
        let mut stats = ControlQueueStats::default();
        for request in &state.requests {
            stats.record(request.status, 1);
        }
        Ok(stats)
    }
}

#[async_trait]
impl NasDeviceStore for MemoryStore {
    async fn find_by_ip(&self, nas_ip_address: &str) -> AppResult<Option<NasDevice>> {
        Ok(self.state.lock().await.devices.get(nas_ip_address).cloned())
    }

    async fn upsert_device(
        &self,
        nas_ip_address: &str,
        name: &str,
        connection_method: &str,
        enabled: bool,
    ) -> AppResult<NasDevice> {
        let mut state = self.state.lock().await;
        let device = state
            .devices
            .entry(nas_ip_address.to_string())
            .or_insert_with(|| NasDevice {
                id: NasDeviceId::new(),
                nas_ip_address: nas_ip_address.to_string(),
                name: String::new(),
                connection_method: String::new(),
                enabled,
                created_at: Utc::now(),
            });
        device.name = name.to_string();
        device.connection_method = connection_method.to_string();
        device.enabled = enabled;
        Ok(device.clone())
    }
}
