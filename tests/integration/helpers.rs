//! Shared test helpers for integration tests.
//!
//! Every test gets its own in-memory store, a scripted simulated NAS adapter
//! and a router built exactly as the server builds it.

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use accessgate_api::AppState;
use accessgate_cache::memory::MemoryWindowStore;
use accessgate_cache::{RateLimitRule, RateLimiter};
use accessgate_core::config::AppConfig;
use accessgate_core::types::ProfileId;
use accessgate_database::{MemoryStore, Stores};
use accessgate_entity::profile::AccessProfile;
use accessgate_nas::adapters::SimulatedNasAdapter;
use accessgate_nas::{ConnectionMethod, NasAdapterRegistry};
use accessgate_service::Services;

pub const MB: i64 = 1_048_576;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Services behind the router
    pub services: Services,
    /// Stores behind the services
    pub stores: Stores,
    /// Scripted NAS adapter
    pub adapter: Arc<SimulatedNasAdapter>,
    /// Profile with a 500 MB data quota
    pub profile_id: ProfileId,
}

impl TestApp {
    /// Create a new test application with generous rate limits
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test application after adjusting the default configuration
    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut config = AppConfig::default();
        config.server.trust_forwarded_for = true;
        config.rate_limit.accounting.max_requests = 10_000;
        config.rate_limit.control.max_requests = 10_000;
        adjust(&mut config);

        let memory = Arc::new(MemoryStore::new());
        let profile_id = ProfileId::new();
        memory
            .insert_profile(AccessProfile {
                id: profile_id,
                name: "hotspot-500mb".to_string(),
                quota_data_mb: Some(500),
                quota_time_minutes: None,
                bandwidth_up_kbps: Some(2_048),
                bandwidth_down_kbps: Some(10_240),
            })
            .await;
        let stores = Stores::memory(memory);

        let adapter = Arc::new(SimulatedNasAdapter::new(&config.nas.simulated));
        let mut registry =
            NasAdapterRegistry::new(stores.nas_devices.clone(), ConnectionMethod::Simulated);
        registry.register(ConnectionMethod::Simulated, adapter.clone());

        let services = Services::new(&stores, Arc::new(registry), &config);

        let (accounting_limiter, control_limiter) = if config.rate_limit.enabled {
            let window = Arc::new(MemoryWindowStore::new());
            (
                Some(RateLimiter::new(
                    window.clone(),
                    RateLimitRule::from(config.rate_limit.accounting),
                    "accounting",
                )),
                Some(RateLimiter::new(
                    window,
                    RateLimitRule::from(config.rate_limit.control),
                    "control",
                )),
            )
        } else {
            (None, None)
        };

        let state = AppState::new(
            Arc::new(config),
            services.clone(),
            accounting_limiter,
            control_limiter,
        );

        Self {
            router: accessgate_api::build_router(state),
            services,
            stores,
            adapter,
            profile_id,
        }
    }

    /// Make an HTTP request from `source` (sent as `X-Forwarded-For`)
    pub async fn request_from(
        &self,
        source: &str,
        method: &str,
        path: &str,
        body: Option<Value>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", source)
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Make an HTTP request from the default test source
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        self.request_from("198.51.100.10", method, path, body).await
    }

    /// Pre-create a session in `authorized`
    pub async fn register_session(&self, session_id: &str, user_id: &str) {
        let response = self
            .request(
                "POST",
                "/api/radius/sessions",
                Some(json!({
                    "session_id": session_id,
                    "user_id": user_id,
                    "profile_id": self.profile_id,
                    "nas_ip_address": "10.0.0.1",
                    "nas_port_id": "wlan0",
                    "mac_address": "AA:BB:CC:DD:EE:FF",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    }

    /// Post an accounting event with byte and time counters
    pub async fn accounting(
        &self,
        session_id: &str,
        status_type: &str,
        input_octets: i64,
        session_time: i64,
    ) -> TestResponse {
        self.request(
            "POST",
            "/api/radius/accounting",
            Some(json!({
                "session_id": session_id,
                "username": "alice",
                "status_type": status_type,
                "input_octets": input_octets,
                "output_octets": 0,
                "session_time": session_time,
                "ap_name": "lobby-ap",
                "ssid": "Guest",
            })),
        )
        .await
    }

    /// Fetch the session detail payload
    pub async fn session(&self, session_id: &str) -> Value {
        let response = self
            .request("GET", &format!("/api/radius/sessions/{session_id}"), None)
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["session"].clone()
    }

    /// List control requests, optionally by status
    pub async fn control_requests(&self, status: Option<&str>) -> Vec<Value> {
        let path = match status {
            Some(status) => format!("/api/radius/control/requests?status={status}"),
            None => "/api/radius/control/requests".to_string(),
        };
        let response = self.request("GET", &path, None).await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["requests"]
            .as_array()
            .cloned()
            .unwrap_or_default()
    }
}

/// Parsed test response
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// Header value as a string
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
