//! Integration tests for per-source ingress rate limiting.

mod helpers;

use std::time::Duration;

use http::StatusCode;

use accessgate_core::config::rate_limit::RateLimitRuleConfig;

use helpers::TestApp;

async fn limited_app(accounting: u32, control: u32, window_ms: u64) -> TestApp {
    TestApp::with_config(|config| {
        config.rate_limit.accounting = RateLimitRuleConfig {
            window_ms,
            max_requests: accounting,
        };
        config.rate_limit.control = RateLimitRuleConfig {
            window_ms,
            max_requests: control,
        };
    })
    .await
}

#[tokio::test]
async fn test_control_group_is_limited_with_headers() {
    let app = limited_app(100, 3, 60_000).await;

    for expected_remaining in ["2", "1", "0"] {
        let response = app
            .request_from("203.0.113.5", "GET", "/api/radius/control/requests", None)
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.header("x-ratelimit-limit"), Some("3"));
        assert_eq!(
            response.header("x-ratelimit-remaining"),
            Some(expected_remaining)
        );
    }

    let limited = app
        .request_from("203.0.113.5", "GET", "/api/radius/control/requests", None)
        .await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(limited.body["status"], "error");
    assert_eq!(limited.body["code"], "RATE_LIMITED");
    assert_eq!(limited.header("x-ratelimit-remaining"), Some("0"));
    let reset: i64 = limited
        .header("x-ratelimit-reset")
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    assert!(reset >= chrono::Utc::now().timestamp());
}

#[tokio::test]
async fn test_groups_are_counted_separately() {
    let app = limited_app(100, 1, 60_000).await;
    app.register_session("s-1", "alice").await;

    // The control budget is spent on registration; accounting still flows.
    let control = app
        .request("GET", "/api/radius/sessions/s-1", None)
        .await;
    assert_eq!(control.status, StatusCode::TOO_MANY_REQUESTS);

    for _ in 0..5 {
        let response = app.accounting("s-1", "interim-update", 0, 0).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let health = app.request("GET", "/api/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert!(health.header("x-ratelimit-limit").is_none());
}

#[tokio::test]
async fn test_sources_are_isolated() {
    let app = limited_app(2, 100, 60_000).await;

    for _ in 0..2 {
        let response = app
            .request_from("192.0.2.1", "POST", "/api/radius/accounting", None)
            .await;
        assert_ne!(response.status, StatusCode::TOO_MANY_REQUESTS);
    }
    let blocked = app
        .request_from("192.0.2.1", "POST", "/api/radius/accounting", None)
        .await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);

    let other = app
        .request_from("192.0.2.2", "POST", "/api/radius/accounting", None)
        .await;
    assert_ne!(other.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(other.header("x-ratelimit-remaining"), Some("1"));
}

#[tokio::test]
async fn test_window_slides() {
    let app = limited_app(2, 100, 300).await;

    for _ in 0..2 {
        let response = app
            .request_from("192.0.2.9", "POST", "/api/radius/accounting", None)
            .await;
        assert_ne!(response.status, StatusCode::TOO_MANY_REQUESTS);
    }
    let blocked = app
        .request_from("192.0.2.9", "POST", "/api/radius/accounting", None)
        .await;
    assert_eq!(blocked.status, StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(400)).await;

    let allowed = app
        .request_from("192.0.2.9", "POST", "/api/radius/accounting", None)
        .await;
    assert_ne!(allowed.status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_disabled_limiter_sets_no_headers() {
    let app = TestApp::with_config(|config| config.rate_limit.enabled = false).await;

    let response = app
        .request("GET", "/api/radius/control/requests", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header("x-ratelimit-limit").is_none());
}
