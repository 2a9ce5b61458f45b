//! Integration tests for the control dispatch queue endpoints.

mod helpers;

use http::StatusCode;
use serde_json::json;

use accessgate_entity::control::{ControlAttributes, ControlRequestType};
use accessgate_nas::NasResponse;

use helpers::{MB, TestApp};

async fn started(app: &TestApp, session_id: &str, user_id: &str) {
    app.register_session(session_id, user_id).await;
    let response = app.accounting(session_id, "start", 0, 0).await;
    assert_eq!(response.status, StatusCode::OK);
}

async fn process_pending(app: &TestApp) -> serde_json::Value {
    let response = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "process_pending" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    response.body
}

#[tokio::test]
async fn test_user_disconnect_stops_sessions_only_after_ack() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;
    started(&app, "s-2", "bob").await;
    started(&app, "s-3", "carol").await;

    let response = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "disconnect", "user_id": "bob" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    let requests = response.body["requests"].as_array().cloned().unwrap_or_default();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r["status"] == "pending"));
    assert!(requests.iter().all(|r| r["attributes"]["reason"] == "admin_disconnect"));

    // Queued, not yet sent: the sessions are untouched.
    assert_eq!(app.session("s-1").await["state"], "active");
    assert_eq!(app.session("s-2").await["state"], "active");

    let body = process_pending(&app).await;
    assert_eq!(body["processed_requests"], 2);
    assert_eq!(body["report"]["acked"], 2);
    assert_eq!(body["report"]["sessions_stopped"], 2);

    for id in ["s-1", "s-2"] {
        let session = app.session(id).await;
        assert_eq!(session["state"], "stopped");
        assert_eq!(session["terminate_cause"], "admin_disconnect");
    }
    assert_eq!(app.session("s-3").await["state"], "active");
    assert_eq!(app.adapter.sent().await.len(), 2);
}

#[tokio::test]
async fn test_user_without_open_sessions_queues_nothing() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "disconnect", "user_id": "nobody" })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.get("requests").is_none());
    assert!(app.control_requests(None).await.is_empty());
}

#[tokio::test]
async fn test_repeat_disconnect_returns_outstanding_request() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;

    let body = json!({ "action": "disconnect", "session_id": "s-1" });
    let first = app
        .request("POST", "/api/radius/control", Some(body.clone()))
        .await;
    let second = app
        .request("POST", "/api/radius/control", Some(body))
        .await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body["requests"][0]["id"], second.body["requests"][0]["id"]);
    assert_eq!(app.control_requests(None).await.len(), 1);
}

#[tokio::test]
async fn test_process_pending_drains_default_batch() {
    let app = TestApp::new().await;
    for id in ["s-1", "s-2", "s-3"] {
        started(&app, id, id).await;
        let response = app
            .request(
                "POST",
                "/api/radius/control",
                Some(json!({ "action": "disconnect", "session_id": id })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let body = process_pending(&app).await;
    assert_eq!(body["processed_requests"], 3);
    assert_eq!(app.control_requests(Some("ack")).await.len(), 3);

    let empty = process_pending(&app).await;
    assert_eq!(empty["processed_requests"], 0);
}

#[tokio::test]
async fn test_process_pending_respects_batch_size() {
    let app = TestApp::new().await;
    for id in ["s-1", "s-2", "s-3"] {
        started(&app, id, "bob").await;
    }
    app.request(
        "POST",
        "/api/radius/control",
        Some(json!({ "action": "disconnect", "user_id": "bob" })),
    )
    .await;

    let response = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "process_pending", "batch_size": 2 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["processed_requests"], 2);
    assert_eq!(app.control_requests(Some("pending")).await.len(), 1);
}

#[tokio::test]
async fn test_nak_is_kept_until_requeued() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;
    app.adapter
        .push_outcome(Ok(NasResponse::nak(Some(503), "NAS busy")))
        .await;

    app.request(
        "POST",
        "/api/radius/control",
        Some(json!({ "action": "disconnect", "session_id": "s-1" })),
    )
    .await;
    let body = process_pending(&app).await;
    assert_eq!(body["report"]["naked"], 1);

    let naks = app.control_requests(Some("nak")).await;
    assert_eq!(naks.len(), 1);
    assert_eq!(naks[0]["error_message"], "NAS busy");
    assert_eq!(naks[0]["response_code"], 503);
    assert_eq!(app.session("s-1").await["state"], "active");

    // Nothing is retried automatically.
    let again = process_pending(&app).await;
    assert_eq!(again["processed_requests"], 0);

    let nak_id = naks[0]["id"].as_str().unwrap_or_default().to_string();
    let response = app
        .request(
            "POST",
            &format!("/api/radius/control/requests/{nak_id}/requeue"),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["requests"][0]["status"], "pending");
    assert_eq!(response.body["requests"][0]["requeued_from"], nak_id.as_str());

    process_pending(&app).await;
    assert_eq!(app.session("s-1").await["state"], "stopped");
    assert_eq!(app.control_requests(Some("nak")).await.len(), 1);
    assert_eq!(app.control_requests(Some("ack")).await.len(), 1);
}

#[tokio::test]
async fn test_requeue_rejects_non_nak_and_unknown() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;

    let response = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "disconnect", "session_id": "s-1" })),
        )
        .await;
    let pending_id = response.body["requests"][0]["id"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    let conflict = app
        .request(
            "POST",
            &format!("/api/radius/control/requests/{pending_id}/requeue"),
            None,
        )
        .await;
    assert_eq!(conflict.status, StatusCode::CONFLICT);

    let missing = app
        .request(
            "POST",
            &format!("/api/radius/control/requests/{}/requeue", uuid::Uuid::new_v4()),
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_target_must_be_exactly_one() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;

    let both = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "disconnect", "session_id": "s-1", "user_id": "bob" })),
        )
        .await;
    assert_eq!(both.status, StatusCode::BAD_REQUEST);

    let neither = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "coa" })),
        )
        .await;
    assert_eq!(neither.status, StatusCode::BAD_REQUEST);

    let unknown = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "disconnect", "session_id": "ghost" })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let bad_action = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "reboot", "session_id": "s-1" })),
        )
        .await;
    assert_eq!(bad_action.status, StatusCode::BAD_REQUEST);

    assert!(app.control_requests(None).await.is_empty());
}

#[tokio::test]
async fn test_coa_queues_reauthorize_and_keeps_session() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;

    let response = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({
                "action": "coa",
                "session_id": "s-1",
                "attributes": { "reason": "admin_reauthorize", "bandwidth_down_kbps": 20480 },
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    assert_eq!(response.body["requests"][0]["request_type"], "reauthorize");
    assert_eq!(
        response.body["requests"][0]["attributes"]["bandwidth_down_kbps"],
        20480
    );

    // A reauthorize and a disconnect can be outstanding together.
    let disconnect = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({ "action": "disconnect", "session_id": "s-1" })),
        )
        .await;
    assert_eq!(disconnect.status, StatusCode::OK);
    assert_eq!(app.control_requests(Some("pending")).await.len(), 2);

    let mismatched = app
        .request(
            "POST",
            "/api/radius/control",
            Some(json!({
                "action": "coa",
                "session_id": "s-1",
                "attributes": { "reason": "admin_disconnect" },
            })),
        )
        .await;
    assert_eq!(mismatched.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quota_disconnect_ack_stops_expired_session() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;
    app.accounting("s-1", "interim-update", 600 * MB, 60).await;
    assert_eq!(app.session("s-1").await["state"], "expired");

    let body = process_pending(&app).await;
    assert_eq!(body["report"]["sessions_stopped"], 1);

    let session = app.session("s-1").await;
    assert_eq!(session["state"], "stopped");
    assert_eq!(session["terminate_cause"], "quota_exceeded");
}

#[tokio::test]
async fn test_concurrent_drains_dispatch_each_request_once() {
    let app = TestApp::new().await;
    for i in 0..6 {
        started(&app, &format!("s-{i}"), "bob").await;
    }
    app.services
        .dispatch
        .disconnect_user("bob", ControlAttributes::admin(ControlRequestType::Disconnect))
        .await
        .expect("enqueue");

    let dispatch = &app.services.dispatch;
    let (a, b, c) = tokio::join!(
        dispatch.drain(Some(1)),
        dispatch.drain(Some(4)),
        dispatch.drain(None),
    );
    let claimed = a.expect("drain").claimed + b.expect("drain").claimed + c.expect("drain").claimed;
    assert_eq!(claimed, 6);
    assert_eq!(app.adapter.sent().await.len(), 6);
    assert_eq!(app.control_requests(Some("ack")).await.len(), 6);
}

#[tokio::test]
async fn test_list_requests_reports_stats() {
    let app = TestApp::new().await;
    started(&app, "s-1", "bob").await;
    app.request(
        "POST",
        "/api/radius/control",
        Some(json!({ "action": "disconnect", "session_id": "s-1" })),
    )
    .await;

    let response = app
        .request("GET", "/api/radius/control/requests", None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["stats"]["pending"], 1);
    assert_eq!(response.body["stats"]["ack"], 0);

    let bad = app
        .request("GET", "/api/radius/control/requests?status=lost", None)
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_store() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["store"], "connected");
}
