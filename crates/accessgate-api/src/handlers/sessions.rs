//! Session registration and lookup handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use accessgate_core::types::ApiResponse;
use accessgate_service::SessionDetail;

use crate::dto::request::RegisterSessionRequest;
use crate::dto::response::SessionResponse;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// POST /api/radius/sessions
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionResponse>>), ApiError> {
    let session = state.services.sessions.register(req.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionResponse { session }).with_message("Session authorized")),
    ))
}

/// GET /api/radius/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionDetail>>, ApiError> {
    let detail = state.services.sessions.detail(&session_id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}
