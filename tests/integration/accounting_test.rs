//! Integration tests for accounting ingestion and quota enforcement.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::{MB, TestApp};

#[tokio::test]
async fn test_unknown_session_is_rejected_without_creating_it() {
    let app = TestApp::new().await;

    let response = app.accounting("ghost-1", "start", 0, 0).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["status"], "error");
    assert_eq!(response.body["code"], "SESSION_NOT_FOUND");

    let lookup = app
        .request("GET", "/api/radius/sessions/ghost-1", None)
        .await;
    assert_eq!(lookup.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_status_type_is_bad_request() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;

    let response = app.accounting("s-1", "accounting-on", 0, 0).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["code"], "INVALID_STATUS_TYPE");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/radius/accounting",
            Some(json!({ "session_id": "", "status_type": "start" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "POST",
            "/api/radius/accounting",
            Some(json!({ "session_id": "s-1", "status_type": "interim-update", "input_octets": -5 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_then_interims_activate_and_accumulate() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    assert_eq!(app.session("s-1").await["state"], "authorized");

    let response = app.accounting("s-1", "start", 0, 0).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");

    let session = app.session("s-1").await;
    assert_eq!(session["state"], "active");
    assert!(session["start_time"].is_string());

    app.accounting("s-1", "interim-update", 10 * MB, 60).await;
    app.accounting("s-1", "interim-update", 25 * MB, 120).await;

    let session = app.session("s-1").await;
    assert_eq!(session["rx_bytes"], 25 * MB);
    assert_eq!(session["session_time"], 120);
    assert_eq!(session["ap_name"], "lobby-ap");
}

#[tokio::test]
async fn test_lower_counter_never_decreases_stored_value() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    app.accounting("s-1", "start", 0, 0).await;

    app.accounting("s-1", "interim-update", 30 * MB, 300).await;
    let response = app.accounting("s-1", "interim-update", 5 * MB, 200).await;
    assert_eq!(response.status, StatusCode::OK);

    let session = app.session("s-1").await;
    assert_eq!(session["rx_bytes"], 30 * MB);
    assert_eq!(session["session_time"], 300);
}

#[tokio::test]
async fn test_gigawords_extend_octet_counters() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    app.accounting("s-1", "start", 0, 0).await;

    let response = app
        .request(
            "POST",
            "/api/radius/accounting",
            Some(json!({
                "session_id": "s-1",
                "status_type": "interim-update",
                "input_octets": 100,
                "input_gigawords": 1,
                "output_octets": 7,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let session = app.session("s-1").await;
    assert_eq!(session["rx_bytes"], (1_i64 << 32) + 100);
    assert_eq!(session["tx_bytes"], 7);
}

#[tokio::test]
async fn test_out_of_range_counters_are_rejected_and_leave_session_untouched() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    app.accounting("s-1", "start", 0, 0).await;
    app.accounting("s-1", "interim-update", 10 * MB, 60).await;

    for body in [
        json!({ "session_id": "s-1", "status_type": "interim-update", "session_time": i64::MAX }),
        json!({ "session_id": "s-1", "status_type": "interim-update", "input_octets": 1, "input_gigawords": 1_i64 << 32 }),
        json!({ "session_id": "s-1", "status_type": "interim-update", "input_octets": 5_000_000_000_i64, "input_gigawords": 1 }),
        json!({ "session_id": "s-1", "status_type": "interim-update", "input_octets": 1, "input_gigawords": u32::MAX }),
    ] {
        let response = app
            .request("POST", "/api/radius/accounting", Some(body))
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
    }

    let session = app.session("s-1").await;
    assert_eq!(session["rx_bytes"], 10 * MB);
    assert_eq!(session["session_time"], 60);
}

#[tokio::test]
async fn test_wide_octet_counter_with_zero_gigawords_counts_toward_quota() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    app.accounting("s-1", "start", 0, 0).await;

    let response = app
        .request(
            "POST",
            "/api/radius/accounting",
            Some(json!({
                "session_id": "s-1",
                "status_type": "interim-update",
                "input_octets": 5_000_000_000_i64,
                "input_gigawords": 0,
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let session = app.session("s-1").await;
    assert_eq!(session["rx_bytes"], 5_000_000_000_i64);
    assert_eq!(session["state"], "expired");
}

#[tokio::test]
async fn test_stop_is_terminal_and_later_events_are_ignored() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    app.accounting("s-1", "start", 0, 0).await;
    app.accounting("s-1", "interim-update", 10 * MB, 60).await;

    let response = app.accounting("s-1", "stop", 12 * MB, 90).await;
    assert_eq!(response.status, StatusCode::OK);

    let stopped = app.session("s-1").await;
    assert_eq!(stopped["state"], "stopped");
    assert_eq!(stopped["rx_bytes"], 12 * MB);
    assert_eq!(stopped["terminate_cause"], "user_request");

    let again = app.accounting("s-1", "stop", 50 * MB, 500).await;
    assert_eq!(again.status, StatusCode::OK);
    assert!(
        again.body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("ignored")
    );

    let late = app.accounting("s-1", "interim-update", 99 * MB, 900).await;
    assert_eq!(late.status, StatusCode::OK);

    let unchanged = app.session("s-1").await;
    assert_eq!(unchanged["state"], "stopped");
    assert_eq!(unchanged["rx_bytes"], 12 * MB);
    assert_eq!(unchanged["session_time"], 90);
    assert_eq!(unchanged["stop_time"], stopped["stop_time"]);
}

#[tokio::test]
async fn test_quota_breach_queues_one_disconnect_and_expires_session() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    app.accounting("s-1", "start", 0, 0).await;

    app.accounting("s-1", "interim-update", 400 * MB, 600).await;
    assert_eq!(app.session("s-1").await["state"], "active");
    assert!(app.control_requests(None).await.is_empty());

    let response = app
        .accounting("s-1", "interim-update", 550 * MB, 900)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let session = app.session("s-1").await;
    assert_eq!(session["state"], "expired");
    assert_eq!(session["terminate_cause"], "quota_exceeded");

    let requests = app.control_requests(Some("pending")).await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["session_id"], "s-1");
    assert_eq!(requests[0]["request_type"], "disconnect");
    assert_eq!(requests[0]["attributes"]["reason"], "quota_exceeded");
    assert_eq!(requests[0]["attributes"]["limit"], "data");
    assert_eq!(requests[0]["attributes"]["quota"], 500);

    // Further events for the expired session neither change it nor queue more.
    app.accounting("s-1", "interim-update", 700 * MB, 1200)
        .await;
    assert_eq!(app.control_requests(None).await.len(), 1);
    assert_eq!(app.session("s-1").await["rx_bytes"], 550 * MB);
}

#[tokio::test]
async fn test_usage_is_reported_with_session_detail() {
    let app = TestApp::new().await;
    app.register_session("s-1", "alice").await;
    app.accounting("s-1", "start", 0, 0).await;
    app.accounting("s-1", "interim-update", 120 * MB, 600).await;

    let response = app
        .request("GET", "/api/radius/sessions/s-1", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["profile"]["name"], "hotspot-500mb");
    assert_eq!(response.body["user_access"]["quota_used_mb"], 120);
    assert_eq!(response.body["user_access"]["minutes_used"], 10);
}
