//! Durable queue of disconnect and reauthorize commands.
//!
//! A drain claims pending requests atomically (marking them `sent` before
//! any network call), sends each through the NAS adapter under a timeout,
//! and records `ack` or `nak`. There is no automatic retry; operators
//! requeue `nak` requests explicitly.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use futures::stream;
use tracing::{debug, error, info, warn};

use accessgate_core::config::dispatch::DispatchConfig;
use accessgate_core::config::nas::NasConfig;
use accessgate_core::error::AppError;
use accessgate_core::result::AppResult;
use accessgate_core::types::ControlRequestId;
use accessgate_database::store::{ControlRequestStore, SessionStore};
use accessgate_entity::control::{
    ControlAttributes, ControlQueueStats, ControlRequest, ControlRequestType, ControlStatus,
    EnqueueOutcome, NewControlRequest,
};
use accessgate_entity::session::{RadiusSession, SessionState};
use accessgate_nas::{ControlCommand, NasAdapterRegistry, NasResponse};

use super::report::{DispatchResult, DrainReport};

/// Error recorded on requests resolved by the stale-`sent` sweep.
pub const UNRESOLVED_AFTER_DISPATCH: &str = "unresolved after dispatch";

/// Control dispatch queue service.
#[derive(Clone)]
pub struct ControlDispatchQueue {
    sessions: Arc<dyn SessionStore>,
    requests: Arc<dyn ControlRequestStore>,
    registry: Arc<NasAdapterRegistry>,
    adapter_timeout: Duration,
    default_batch_size: u32,
    concurrency: usize,
}

impl ControlDispatchQueue {
    /// Create a new dispatch queue.
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        requests: Arc<dyn ControlRequestStore>,
        registry: Arc<NasAdapterRegistry>,
        dispatch: &DispatchConfig,
        nas: &NasConfig,
    ) -> Self {
        Self {
            sessions,
            requests,
            registry,
            adapter_timeout: Duration::from_millis(nas.timeout_ms),
            default_batch_size: dispatch.batch_size.max(1),
            concurrency: dispatch.concurrency.max(1),
        }
    }

    /// Batch size used when a drain does not specify one.
    pub fn default_batch_size(&self) -> u32 {
        self.default_batch_size
    }

    /// Queue a command for one session.
    ///
    /// Returns the outstanding request of the same type instead of creating
    /// a second one.
    pub async fn enqueue(
        &self,
        session_id: &str,
        request_type: ControlRequestType,
        attributes: ControlAttributes,
    ) -> AppResult<EnqueueOutcome> {
        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or_else(|| AppError::session_not_found(session_id))?;
        self.enqueue_for(&session, request_type, attributes, None)
            .await
    }

    /// Queue a command for a session already loaded by the caller.
    pub async fn enqueue_for(
        &self,
        session: &RadiusSession,
        request_type: ControlRequestType,
        attributes: ControlAttributes,
        requeued_from: Option<ControlRequestId>,
    ) -> AppResult<EnqueueOutcome> {
        if !attributes.fits(request_type) {
            return Err(AppError::invalid_request(format!(
                "Attributes with reason '{}' do not apply to {request_type}",
                attributes.reason()
            )));
        }
        if session.state == SessionState::Stopped {
            return Err(AppError::conflict(format!(
                "Session '{}' is already stopped",
                session.session_id
            )));
        }

        let outcome = self
            .requests
            .enqueue_guarded(NewControlRequest {
                session_id: session.session_id.clone(),
                request_type,
                attributes,
                nas_ip_address: session.nas_ip_address.clone(),
                nas_port_id: session.nas_port_id.clone(),
                requeued_from,
            })
            .await?;

        match &outcome {
            EnqueueOutcome::Created(req) => info!(
                request_id = %req.id,
                session_id = %req.session_id,
                request_type = %req.request_type,
                reason = req.attributes.reason(),
                "Control request queued"
            ),
            EnqueueOutcome::Existing(req) => debug!(
                request_id = %req.id,
                session_id = %req.session_id,
                status = %req.status,
                "Control request already outstanding"
            ),
        }
        Ok(outcome)
    }

    /// Queue one guarded command per non-terminal session of a user.
    pub async fn enqueue_for_user(
        &self,
        user_id: &str,
        request_type: ControlRequestType,
        attributes: ControlAttributes,
    ) -> AppResult<Vec<EnqueueOutcome>> {
        let sessions = self.sessions.find_open_sessions_by_user(user_id).await?;
        let mut outcomes = Vec::with_capacity(sessions.len());
        for session in &sessions {
            outcomes.push(
                self.enqueue_for(session, request_type, attributes.clone(), None)
                    .await?,
            );
        }
        info!(
            user_id,
            sessions = sessions.len(),
            request_type = %request_type,
            "Queued control requests for user"
        );
        Ok(outcomes)
    }

    /// Disconnect every non-terminal session of a user.
    pub async fn disconnect_user(
        &self,
        user_id: &str,
        attributes: ControlAttributes,
    ) -> AppResult<Vec<EnqueueOutcome>> {
        self.enqueue_for_user(user_id, ControlRequestType::Disconnect, attributes)
            .await
    }

    /// Claim up to `batch_size` pending requests (oldest first) and dispatch them.
    pub async fn drain(&self, batch_size: Option<u32>) -> AppResult<DrainReport> {
        let limit = batch_size.unwrap_or(self.default_batch_size).max(1);
        let claimed = self.requests.claim_pending(limit).await?;

        let mut report = DrainReport {
            claimed: claimed.len(),
            ..DrainReport::default()
        };
        if claimed.is_empty() {
            return Ok(report);
        }

        let outcomes: Vec<_> = stream::iter(claimed)
            .map(|request| async move { self.dispatch(request).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        for (result, timed_out, stopped) in outcomes {
            report.record(result, timed_out, stopped);
        }

        info!(
            claimed = report.claimed,
            acked = report.acked,
            naked = report.naked,
            timed_out = report.timed_out,
            unresolved = report.unresolved,
            "Control queue drained"
        );
        Ok(report)
    }

    /// Send one claimed request and record its outcome.
    /// Returns the result plus whether the call timed out and whether a
    /// session was finalized.
    async fn dispatch(&self, request: ControlRequest) -> (DispatchResult, bool, bool) {
        let command = ControlCommand::from(&request);
        let mut timed_out = false;
        let mut adapter_name = None;

        let response = match self.registry.resolve(&request.nas_ip_address).await {
            Ok((method, adapter)) => {
                adapter_name = Some(method.as_str().to_string());
                match tokio::time::timeout(self.adapter_timeout, adapter.send_control(&command))
                    .await
                {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => NasResponse::nak(None, e.message),
                    Err(_) => {
                        timed_out = true;
                        NasResponse::nak(
                            None,
                            AppError::adapter_timeout(format!(
                                "NAS adapter timed out after {} ms",
                                self.adapter_timeout.as_millis()
                            ))
                            .message,
                        )
                    }
                }
            }
            Err(e) => NasResponse::nak(None, e.message),
        };

        let status = if response.success {
            ControlStatus::Ack
        } else {
            ControlStatus::Nak
        };
        let mut result = DispatchResult {
            request_id: request.id,
            session_id: request.session_id.clone(),
            request_type: request.request_type,
            status,
            response_code: response.response_code,
            error: response.error.clone(),
            adapter: adapter_name,
        };

        let resolved = self
            .requests
            .resolve(
                request.id,
                status,
                response.response_code,
                response.error.as_deref(),
            )
            .await;
        match resolved {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(
                    request_id = %request.id,
                    "Control request was resolved elsewhere before its outcome was recorded"
                );
                result.status = ControlStatus::Sent;
                return (result, timed_out, false);
            }
            Err(e) => {
                error!(request_id = %request.id, error = %e, "Failed to record control outcome");
                result.status = ControlStatus::Sent;
                return (result, timed_out, false);
            }
        }

        if status == ControlStatus::Nak {
            warn!(
                request_id = %request.id,
                session_id = %request.session_id,
                response_code = ?response.response_code,
                error = ?response.error,
                "NAS rejected control request"
            );
            return (result, timed_out, false);
        }

        let mut stopped = false;
        if request.request_type == ControlRequestType::Disconnect {
            let cause = request.attributes.terminate_cause();
            match self
                .sessions
                .finalize_disconnect(&request.session_id, &cause, Utc::now())
                .await
            {
                Ok(changed) => stopped = changed,
                Err(e) => error!(
                    session_id = %request.session_id,
                    error = %e,
                    "Failed to finalize disconnected session"
                ),
            }
        }
        info!(
            request_id = %request.id,
            session_id = %request.session_id,
            request_type = %request.request_type,
            "NAS acknowledged control request"
        );
        (result, timed_out, stopped)
    }

    /// Queue a fresh copy of a `nak` request. The `nak` row stays as history.
    pub async fn requeue(&self, id: ControlRequestId) -> AppResult<EnqueueOutcome> {
        let source = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Control request '{id}' not found")))?;
        if source.status != ControlStatus::Nak {
            return Err(AppError::conflict(format!(
                "Only nak requests can be requeued; '{id}' is {}",
                source.status
            )));
        }
        let session = self
            .sessions
            .find_session(&source.session_id)
            .await?
            .ok_or_else(|| AppError::session_not_found(&source.session_id))?;
        self.enqueue_for(&session, source.request_type, source.attributes, Some(id))
            .await
    }

    /// Resolve requests left `sent` for longer than `older_than` as `nak`.
    pub async fn sweep_stale(&self, older_than: Duration) -> AppResult<Vec<ControlRequest>> {
        let age = chrono::Duration::from_std(older_than)
            .map_err(|e| AppError::invalid_request(format!("Invalid sweep age: {e}")))?;
        let swept = self
            .requests
            .sweep_stale_sent(Utc::now() - age, UNRESOLVED_AFTER_DISPATCH)
            .await?;
        for request in &swept {
            warn!(
                request_id = %request.id,
                session_id = %request.session_id,
                "Control request unresolved after dispatch, marked nak"
            );
        }
        Ok(swept)
    }

    /// Find a request by id.
    pub async fn find(&self, id: ControlRequestId) -> AppResult<ControlRequest> {
        self.requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Control request '{id}' not found")))
    }

    /// Most recent requests, optionally filtered by status.
    pub async fn list(
        &self,
        status: Option<ControlStatus>,
        limit: u32,
    ) -> AppResult<Vec<ControlRequest>> {
        self.requests.list(status, limit).await
    }

    /// Counts per status.
    pub async fn stats(&self) -> AppResult<ControlQueueStats> {
        self.requests.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use accessgate_core::ErrorKind;
    use accessgate_core::types::ProfileId;
    use accessgate_database::{MemoryStore, Stores};
    use accessgate_entity::profile::AccessProfile;
    use accessgate_entity::session::{NewSession, TerminateCause};
    use accessgate_nas::ConnectionMethod;
    use accessgate_nas::adapters::SimulatedNasAdapter;

    struct Harness {
        queue: ControlDispatchQueue,
        stores: Stores,
        adapter: Arc<SimulatedNasAdapter>,
    }

    async fn harness(nas: NasConfig) -> Harness {
        let memory = Arc::new(MemoryStore::new());
        let profile_id = ProfileId::new();
        memory
            .insert_profile(AccessProfile {
                id: profile_id,
                name: "basic".into(),
                quota_data_mb: None,
                quota_time_minutes: None,
                bandwidth_up_kbps: None,
                bandwidth_down_kbps: None,
            })
            .await;
        let stores = Stores::memory(memory);
        for (id, user) in [("s1", "alice"), ("s2", "alice"), ("s3", "bob")] {
            stores
                .sessions
                .register_session(NewSession {
                    session_id: id.into(),
                    user_id: user.into(),
                    profile_id,
                    nas_ip_address: "10.0.0.1".into(),
                    nas_port_id: None,
                    mac_address: None,
                })
                .await
                .expect("register");
        }

        let adapter = Arc::new(SimulatedNasAdapter::new(&nas.simulated));
        let mut registry =
            NasAdapterRegistry::new(stores.nas_devices.clone(), ConnectionMethod::Simulated);
        registry.register(ConnectionMethod::Simulated, adapter.clone());

        let queue = ControlDispatchQueue::new(
            stores.sessions.clone(),
            stores.control_requests.clone(),
            Arc::new(registry),
            &DispatchConfig::default(),
            &nas,
        );
        Harness {
            queue,
            stores,
            adapter,
        }
    }

    fn admin_disconnect() -> ControlAttributes {
        ControlAttributes::admin(ControlRequestType::Disconnect)
    }

    #[tokio::test]
    async fn test_enqueue_is_guarded_per_type() {
        let h = harness(NasConfig::default()).await;
        let first = h
            .queue
            .enqueue("s1", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap();
        let second = h
            .queue
            .enqueue("s1", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap();
        assert!(first.is_created());
        assert!(!second.is_created());
        assert_eq!(first.request().id, second.request().id);

        let reauth = h
            .queue
            .enqueue(
                "s1",
                ControlRequestType::Reauthorize,
                ControlAttributes::admin(ControlRequestType::Reauthorize),
            )
            .await
            .unwrap();
        assert!(reauth.is_created());
    }

    #[tokio::test]
    async fn test_enqueue_rejects_unknown_and_mismatched() {
        let h = harness(NasConfig::default()).await;
        let err = h
            .queue
            .enqueue("ghost", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::SessionNotFound));

        let err = h
            .queue
            .enqueue("s1", ControlRequestType::Reauthorize, admin_disconnect())
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::InvalidRequest));
    }

    #[tokio::test]
    async fn test_drain_ack_finalizes_disconnect() {
        let h = harness(NasConfig::default()).await;
        let outcomes = h
            .queue
            .disconnect_user("alice", admin_disconnect())
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 2);

        let before = h.stores.sessions.find_session("s1").await.unwrap().unwrap();
        assert_eq!(before.state, SessionState::Authorized);

        let report = h.queue.drain(None).await.unwrap();
        assert_eq!(report.claimed, 2);
        assert_eq!(report.acked, 2);
        assert_eq!(report.sessions_stopped, 2);
        assert_eq!(h.adapter.sent().await.len(), 2);

        for id in ["s1", "s2"] {
            let session = h.stores.sessions.find_session(id).await.unwrap().unwrap();
            assert_eq!(session.state, SessionState::Stopped);
            assert_eq!(
                session.terminate_cause(),
                Some(TerminateCause::AdminDisconnect)
            );
        }
        let s3 = h.stores.sessions.find_session("s3").await.unwrap().unwrap();
        assert_eq!(s3.state, SessionState::Authorized);
    }

    #[tokio::test]
    async fn test_nak_leaves_session_and_allows_requeue() {
        let h = harness(NasConfig::default()).await;
        h.adapter
            .push_outcome(Ok(NasResponse::nak(Some(503), "busy")))
            .await;
        let created = h
            .queue
            .enqueue("s1", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap()
            .into_request();

        let report = h.queue.drain(Some(10)).await.unwrap();
        assert_eq!(report.naked, 1);
        let naked = h.queue.find(created.id).await.unwrap();
        assert_eq!(naked.status, ControlStatus::Nak);
        assert_eq!(naked.response_code, Some(503));
        let session = h.stores.sessions.find_session("s1").await.unwrap().unwrap();
        assert!(!session.is_terminal());

        let requeued = h.queue.requeue(created.id).await.unwrap();
        assert!(requeued.is_created());
        assert_eq!(requeued.request().requeued_from, Some(created.id));
        let err = h.queue.requeue(requeued.request().id).await.unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn test_adapter_timeout_is_nak() {
        let mut nas = NasConfig::default();
        nas.timeout_ms = 20;
        nas.simulated.latency_ms = 500;
        let h = harness(nas).await;
        h.queue
            .enqueue("s1", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap();

        let report = h.queue.drain(None).await.unwrap();
        assert_eq!(report.naked, 1);
        assert_eq!(report.timed_out, 1);
        let stats = h.queue.stats().await.unwrap();
        assert_eq!(stats.nak, 1);
        assert_eq!(stats.sent, 0);
    }

    #[tokio::test]
    async fn test_concurrent_drains_process_each_once() {
        let h = harness(NasConfig::default()).await;
        for id in ["s1", "s3"] {
            h.queue
                .enqueue(id, ControlRequestType::Disconnect, admin_disconnect())
                .await
                .unwrap();
        }

        let (a, b) = tokio::join!(h.queue.drain(Some(1)), h.queue.drain(Some(1)));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.claimed, 1);
        assert_eq!(b.claimed, 1);
        assert_ne!(a.results[0].request_id, b.results[0].request_id);
        assert_eq!(h.adapter.sent().await.len(), 2);
    }

    #[tokio::test]
    async fn test_enqueue_on_stopped_session_conflicts() {
        let h = harness(NasConfig::default()).await;
        h.queue
            .enqueue("s1", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap();
        h.queue.drain(None).await.unwrap();

        let err = h
            .queue
            .enqueue("s1", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap_err();
        assert!(err.is(ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn test_sweep_resolves_stale_sent() {
        let h = harness(NasConfig::default()).await;
        h.queue
            .enqueue("s1", ControlRequestType::Disconnect, admin_disconnect())
            .await
            .unwrap();
        let claimed = h.stores.control_requests.claim_pending(1).await.unwrap();
        assert_eq!(claimed.len(), 1);

        assert!(
            h.queue
                .sweep_stale(Duration::from_secs(3600))
                .await
                .unwrap()
                .is_empty()
        );
        let swept = h.queue.sweep_stale(Duration::ZERO).await.unwrap();
        assert_eq!(swept.len(), 1);
        assert_eq!(swept[0].status, ControlStatus::Nak);
        assert_eq!(
            swept[0].error_message.as_deref(),
            Some(UNRESOLVED_AFTER_DISPATCH)
        );
    }
}
