//! Control queue handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use accessgate_core::types::{ApiResponse, ControlRequestId};
use accessgate_entity::control::{ControlAttributes, EnqueueOutcome};

use crate::dto::request::{ControlActionRequest, ControlTarget, ListRequestsQuery};
use crate::dto::response::{ControlActionResponse, ControlRequestList};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// POST /api/radius/control
pub async fn control(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ControlActionRequest>,
) -> Result<Json<ApiResponse<ControlActionResponse>>, ApiError> {
    let dispatch = &state.services.dispatch;

    let Some(request_type) = req.action.request_type() else {
        let report = dispatch.drain(req.batch_size).await?;
        let processed = report.processed();
        let message = format!("Processed {processed} pending control requests");
        return Ok(Json(
            ApiResponse::ok(ControlActionResponse {
                processed_requests: Some(processed),
                report: Some(report),
                ..ControlActionResponse::default()
            })
            .with_message(message),
        ));
    };

    let target = req.target()?;
    let attributes = req
        .attributes
        .unwrap_or_else(|| ControlAttributes::admin(request_type));

    let outcomes = match &target {
        ControlTarget::Session(session_id) => {
            vec![dispatch.enqueue(session_id, request_type, attributes).await?]
        }
        ControlTarget::User(user_id) => {
            dispatch
                .enqueue_for_user(user_id, request_type, attributes)
                .await?
        }
    };

    let created = outcomes.iter().filter(|o| o.is_created()).count();
    let existing = outcomes.len() - created;
    let message = match (&target, outcomes.is_empty()) {
        (ControlTarget::User(user_id), true) => {
            format!("No open sessions for user '{user_id}'")
        }
        _ => format!("Queued {created} {request_type} request(s); {existing} already outstanding"),
    };

    Ok(Json(
        ApiResponse::ok(ControlActionResponse {
            requests: outcomes.into_iter().map(EnqueueOutcome::into_request).collect(),
            ..ControlActionResponse::default()
        })
        .with_message(message),
    ))
}

/// GET /api/radius/control/requests
pub async fn list_requests(
    State(state): State<AppState>,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<ApiResponse<ControlRequestList>>, ApiError> {
    let dispatch = &state.services.dispatch;
    let requests = dispatch.list(query.status()?, query.limit()).await?;
    let stats = dispatch.stats().await?;
    Ok(Json(ApiResponse::ok(ControlRequestList { requests, stats })))
}

/// POST /api/radius/control/requests/{id}/requeue
pub async fn requeue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ControlActionResponse>>, ApiError> {
    let outcome = state
        .services
        .dispatch
        .requeue(ControlRequestId::from_uuid(id))
        .await?;
    let message = if outcome.is_created() {
        "Control request requeued"
    } else {
        "A request for this session is already outstanding"
    };
    Ok(Json(
        ApiResponse::ok(ControlActionResponse {
            requests: vec![outcome.into_request()],
            ..ControlActionResponse::default()
        })
        .with_message(message),
    ))
}
