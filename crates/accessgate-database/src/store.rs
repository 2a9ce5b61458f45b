//! Store contracts.
//!
//! Every method that changes a session does its check-then-write under one
//! lock (a `SELECT ... FOR UPDATE` transaction in PostgreSQL, the store mutex
//! in memory) so concurrent accounting for the same session never loses an
//! update.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use accessgate_core::result::AppResult;
use accessgate_core::types::{ControlRequestId, ProfileId};
use accessgate_entity::accounting::NasMeta;
use accessgate_entity::control::{
    ControlQueueStats, ControlRequest, ControlStatus, EnqueueOutcome, NewControlRequest,
};
use accessgate_entity::nas::NasDevice;
use accessgate_entity::profile::{AccessProfile, UserAccess};
use accessgate_entity::session::{CounterUpdate, NewSession, RadiusSession, TerminateCause};

use crate::connection::DatabasePool;
use crate::memory::MemoryStore;
use crate::repositories::{
    ControlRequestRepository, NasDeviceRepository, ProfileRepository, SessionRepository,
};

/// Result of an accounting write against a session.
#[derive(Debug, Clone)]
pub enum SessionWrite {
    /// No session with that id.
    NotFound,
    /// The session was already terminal; nothing changed.
    Terminal(RadiusSession),
    /// The event was applied.
    Applied {
        /// Session after the write.
        session: RadiusSession,
        /// Usage row written in the same transaction, if any.
        usage: Option<UserAccess>,
        /// Counter fields whose reported value was lower than stored.
        regressed: Vec<&'static str>,
    },
}

/// Persistence of RADIUS sessions and the per-user usage they drive.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Find a session by its NAS-supplied id.
    async fn find_session(&self, session_id: &str) -> AppResult<Option<RadiusSession>>;

    /// Create a session in `authorized`. Fails with `Conflict` if the id exists.
    async fn register_session(&self, new: NewSession) -> AppResult<RadiusSession>;

    /// Apply an accounting start.
    async fn record_start(
        &self,
        session_id: &str,
        meta: &NasMeta,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite>;

    /// Merge interim counters and upsert the usage totals atomically. An
    /// update that reports no counters leaves the usage row alone.
    async fn record_interim(
        &self,
        session_id: &str,
        counters: &CounterUpdate,
        meta: &NasMeta,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite>;

    /// Apply final counters, stop the session and upsert usage atomically.
    /// Usage is only upserted when counters were reported.
    async fn record_stop(
        &self,
        session_id: &str,
        counters: &CounterUpdate,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite>;

    /// Move a non-terminal session to `expired`. Returns whether it changed.
    async fn mark_expired(
        &self,
        session_id: &str,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Record an acknowledged disconnect: `stopped` with `cause`.
    /// Sessions already `stopped` are left alone.
    async fn finalize_disconnect(
        &self,
        session_id: &str,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// Non-terminal sessions of a user, oldest first.
    async fn find_open_sessions_by_user(&self, user_id: &str) -> AppResult<Vec<RadiusSession>>;

    /// Expire non-terminal sessions not heard from since `before`.
    /// Returns the ids of the sessions expired.
    async fn expire_stale(
        &self,
        before: DateTime<Utc>,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<String>>;

    /// Usage totals for a (user, profile) pair.
    async fn find_user_access(
        &self,
        user_id: &str,
        profile_id: ProfileId,
    ) -> AppResult<Option<UserAccess>>;

    /// Check backend connectivity.
    async fn health_check(&self) -> AppResult<bool>;
}

/// Read access to access profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync + 'static {
    /// Find a profile by id.
    async fn find_profile(&self, id: ProfileId) -> AppResult<Option<AccessProfile>>;
}

/// The durable control request queue.
#[async_trait]
pub trait ControlRequestStore: Send + Sync + 'static {
    /// Insert a pending request unless one of the same type is outstanding
    /// for the session, in which case that one is returned.
    async fn enqueue_guarded(&self, new: NewControlRequest) -> AppResult<EnqueueOutcome>;

    /// Atomically move up to `limit` pending requests to `sent`, oldest first.
    async fn claim_pending(&self, limit: u32) -> AppResult<Vec<ControlRequest>>;

    /// Resolve a `sent` request to `ack` or `nak`. Returns `None` if it was
    /// not in `sent`.
    async fn resolve(
        &self,
        id: ControlRequestId,
        status: ControlStatus,
        response_code: Option<i32>,
        error_message: Option<&str>,
    ) -> AppResult<Option<ControlRequest>>;

    /// Resolve requests stuck in `sent` since before `before` as `nak`.
    async fn sweep_stale_sent(
        &self,
        before: DateTime<Utc>,
        error_message: &str,
    ) -> AppResult<Vec<ControlRequest>>;

    /// Find a request by id.
    async fn find_by_id(&self, id: ControlRequestId) -> AppResult<Option<ControlRequest>>;

    /// Most recent requests, optionally filtered by status.
    async fn list(
        &self,
        status: Option<ControlStatus>,
        limit: u32,
    ) -> AppResult<Vec<ControlRequest>>;

    /// Counts per status.
    async fn stats(&self) -> AppResult<ControlQueueStats>;
}

/// NAS equipment records.
#[async_trait]
pub trait NasDeviceStore: Send + Sync + 'static {
    /// Find the device reporting as `nas_ip_address`.
    async fn find_by_ip(&self, nas_ip_address: &str) -> AppResult<Option<NasDevice>>;

    /// Insert or update a device keyed by address.
    async fn upsert_device(
        &self,
        nas_ip_address: &str,
        name: &str,
        connection_method: &str,
        enabled: bool,
    ) -> AppResult<NasDevice>;
}

/// The full set of stores used by the services.
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub control_requests: Arc<dyn ControlRequestStore>,
    pub nas_devices: Arc<dyn NasDeviceStore>,
}

impl Stores {
    /// All stores backed by one in-memory store.
    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            sessions: store.clone(),
            profiles: store.clone(),
            control_requests: store.clone(),
            nas_devices: store,
        }
    }

    /// All stores backed by PostgreSQL repositories.
    pub fn postgres(db: &DatabasePool) -> Self {
        let pool = db.pool().clone();
        Self {
            sessions: Arc::new(SessionRepository::new(pool.clone())),
            profiles: Arc::new(ProfileRepository::new(pool.clone())),
            control_requests: Arc::new(ControlRequestRepository::new(pool.clone())),
            nas_devices: Arc::new(NasDeviceRepository::new(pool)),
        }
    }
}
