//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use accessgate_core::types::ApiResponse;

use crate::dto::response::HealthResponse;
use crate::state::AppState;

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let healthy = match state.services.sessions.health().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            false
        }
    };

    let body = HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        store: if healthy { "connected" } else { "unavailable" }.to_string(),
    };

    if healthy {
        (StatusCode::OK, Json(ApiResponse::ok(body)))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::ok(body).with_message("Session store unavailable")),
        )
    }
}
