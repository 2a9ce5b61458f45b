//! RADIUS session repository.
//!
//! Accounting writes lock the session row, merge in Rust with the same
//! transition methods the in-memory store uses, then write the row and the
//! usage upsert in the same transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use accessgate_core::error::{AppError, ErrorKind};
use accessgate_core::result::AppResult;
use accessgate_core::types::ProfileId;
use accessgate_entity::accounting::NasMeta;
use accessgate_entity::profile::UserAccess;
use accessgate_entity::session::{CounterUpdate, NewSession, RadiusSession, TerminateCause};

use crate::store::{SessionStore, SessionWrite};

/// Repository for `radius_sessions` and `user_access`.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_session(
        tx: &mut Transaction<'_, Postgres>,
        session_id: &str,
    ) -> AppResult<Option<RadiusSession>> {
        sqlx::query_as::<_, RadiusSession>(
            "SELECT * FROM radius_sessions WHERE session_id = $1 FOR UPDATE",
        )
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock session", e))
    }

    async fn write_session(
        tx: &mut Transaction<'_, Postgres>,
        session: &RadiusSession,
    ) -> AppResult<RadiusSession> {
        sqlx::query_as::<_, RadiusSession>(
            "UPDATE radius_sessions SET \
                state = $2, nas_port_id = $3, mac_address = $4, ap_name = $5, ssid = $6, \
                start_time = $7, last_seen = $8, stop_time = $9, session_time = $10, \
                rx_bytes = $11, tx_bytes = $12, rx_packets = $13, tx_packets = $14, \
                terminate_cause = $15 \
             WHERE session_id = $1 RETURNING *",
        )
        .bind(&session.session_id)
        .bind(session.state)
        .bind(&session.nas_port_id)
        .bind(&session.mac_address)
        .bind(&session.ap_name)
        .bind(&session.ssid)
        .bind(session.start_time)
        .bind(session.last_seen)
        .bind(session.stop_time)
        .bind(session.session_time)
        .bind(session.rx_bytes)
        .bind(session.tx_bytes)
        .bind(session.rx_packets)
        .bind(session.tx_packets)
        .bind(&session.terminate_cause_raw)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update session", e))
    }

    /// Overwrite the (user, profile) totals with the session's cumulative usage.
    async fn upsert_usage(
        tx: &mut Transaction<'_, Postgres>,
        session: &RadiusSession,
        at: DateTime<Utc>,
    ) -> AppResult<UserAccess> {
        let usage = session.usage();
        sqlx::query_as::<_, UserAccess>(
            "INSERT INTO user_access (user_id, profile_id, quota_used_mb, minutes_used, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (user_id, profile_id) DO UPDATE SET \
                quota_used_mb = EXCLUDED.quota_used_mb, \
                minutes_used = EXCLUDED.minutes_used, \
                updated_at = EXCLUDED.updated_at \
             RETURNING *",
        )
        .bind(&session.user_id)
        .bind(session.profile_id)
        .bind(usage.total_mb)
        .bind(usage.total_minutes)
        .bind(at)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to upsert usage", e))
    }

    /// Run `apply` against the locked row of a non-terminal session and
    /// persist the result, optionally with a usage upsert.
    async fn locked_write<F>(
        &self,
        session_id: &str,
        at: DateTime<Utc>,
        with_usage: bool,
        apply: F,
    ) -> AppResult<SessionWrite>
    where
        F: FnOnce(&mut RadiusSession) -> Vec<&'static str> + Send,
    {
        let mut tx = self.pool.begin().await?;

        let Some(mut session) = Self::lock_session(&mut tx, session_id).await? else {
            tx.rollback().await?;
            return Ok(SessionWrite::NotFound);
        };
        if session.is_terminal() {
            tx.rollback().await?;
            return Ok(SessionWrite::Terminal(session));
        }

        let regressed = apply(&mut session);
        let session = Self::write_session(&mut tx, &session).await?;
        let usage = if with_usage {
            Some(Self::upsert_usage(&mut tx, &session, at).await?)
        } else {
            None
        };

        tx.commit().await?;
        Ok(SessionWrite::Applied {
            session,
            usage,
            regressed,
        })
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn find_session(&self, session_id: &str) -> AppResult<Option<RadiusSession>> {
        sqlx::query_as::<_, RadiusSession>("SELECT * FROM radius_sessions WHERE session_id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    async fn register_session(&self, new: NewSession) -> AppResult<RadiusSession> {
        let inserted = sqlx::query_as::<_, RadiusSession>(
            "INSERT INTO radius_sessions \
                (session_id, user_id, profile_id, nas_ip_address, nas_port_id, mac_address, state) \
             VALUES ($1, $2, $3, $4, $5, $6, 'authorized') \
             ON CONFLICT (session_id) DO NOTHING RETURNING *",
        )
        .bind(&new.session_id)
        .bind(&new.user_id)
        .bind(new.profile_id)
        .bind(&new.nas_ip_address)
        .bind(&new.nas_port_id)
        .bind(&new.mac_address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            let unknown_profile = e
                .as_database_error()
                .is_some_and(|db| db.is_foreign_key_violation());
            if unknown_profile {
                AppError::invalid_request(format!("Unknown profile '{}'", new.profile_id))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to register session", e)
            }
        })?;

        inserted.ok_or_else(|| {
            AppError::conflict(format!("Session '{}' already exists", new.session_id))
        })
    }

    async fn record_start(
        &self,
        session_id: &str,
        meta: &NasMeta,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite> {
        self.locked_write(session_id, at, false, |session| {
            session.record_start(meta, at);
            Vec::new()
        })
        .await
    }

    async fn record_interim(
        &self,
        session_id: &str,
        counters: &CounterUpdate,
        meta: &NasMeta,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite> {
        self.locked_write(session_id, at, !counters.is_empty(), |session| {
            session.record_interim(counters, meta, at)
        })
        .await
    }

    async fn record_stop(
        &self,
        session_id: &str,
        counters: &CounterUpdate,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<SessionWrite> {
        self.locked_write(session_id, at, !counters.is_empty(), |session| {
            session.record_stop(counters, cause, at)
        })
        .await
    }

    async fn mark_expired(
        &self,
        session_id: &str,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE radius_sessions SET state = 'expired', terminate_cause = $2, stop_time = $3 \
             WHERE session_id = $1 AND state IN ('authorized', 'active')",
        )
        .bind(session_id)
        .bind(cause.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to expire session", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn finalize_disconnect(
        &self,
        session_id: &str,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE radius_sessions SET state = 'stopped', terminate_cause = $2, \
                stop_time = COALESCE(stop_time, $3) \
             WHERE session_id = $1 AND state <> 'stopped'",
        )
        .bind(session_id)
        .bind(cause.as_str())
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to finalize disconnect", e)
        })?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_open_sessions_by_user(&self, user_id: &str) -> AppResult<Vec<RadiusSession>> {
        sqlx::query_as::<_, RadiusSession>(
            "SELECT * FROM radius_sessions \
             WHERE user_id = $1 AND state IN ('authorized', 'active') \
             ORDER BY created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user sessions", e))
    }

    async fn expire_stale(
        &self,
        before: DateTime<Utc>,
        cause: &TerminateCause,
        at: DateTime<Utc>,
    ) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            "UPDATE radius_sessions SET state = 'expired', terminate_cause = $2, stop_time = $3 \
             WHERE state IN ('authorized', 'active') AND COALESCE(last_seen, created_at) < $1 \
             RETURNING session_id",
        )
        .bind(before)
        .bind(cause.as_str())
        .bind(at)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to expire stale sessions", e))
    }

    async fn find_user_access(
        &self,
        user_id: &str,
        profile_id: ProfileId,
    ) -> AppResult<Option<UserAccess>> {
        sqlx::query_as::<_, UserAccess>(
            "SELECT * FROM user_access WHERE user_id = $1 AND profile_id = $2",
        )
        .bind(user_id)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user access", e))
    }

    async fn health_check(&self) -> AppResult<bool> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }
}
