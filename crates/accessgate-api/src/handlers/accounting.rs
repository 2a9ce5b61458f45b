//! RADIUS accounting ingestion handler.

use axum::Json;
use axum::extract::State;

use accessgate_core::types::ApiResponse;

use crate::dto::request::AccountingRequest;
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// POST /api/radius/accounting
///
/// Events for terminal sessions are acknowledged with `ok`; the message says
/// they were ignored.
pub async fn ingest(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<AccountingRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let event = req.into_event()?;
    let outcome = state.services.accounting.apply(event).await?;
    Ok(Json(ApiResponse::message(outcome.message())))
}
