//! Sliding-window rate limiting per request source.
//!
//! Accounting and control-admin routes each get their own limiter; the
//! control group is configured stricter.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use accessgate_cache::{RateLimitDecision, RateLimiter};
use accessgate_core::error::AppError;

use crate::error::ApiError;
use crate::extractors::request_source;
use crate::state::AppState;

pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";

/// Limits `POST /api/radius/accounting`.
pub async fn accounting_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(state.accounting_limiter.as_ref(), &state, request, next).await
}

/// Limits the control-admin routes.
pub async fn control_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(state.control_limiter.as_ref(), &state, request, next).await
}

async fn enforce(
    limiter: Option<&RateLimiter>,
    state: &AppState,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = limiter else {
        return next.run(request).await;
    };

    let source = request_source(
        request.headers(),
        request.extensions(),
        state.config.server.trust_forwarded_for,
    );

    let decision = match limiter.check(&source).await {
        Ok(decision) => decision,
        Err(e) => {
            // Counter store unavailable: let the request through.
            warn!(source = %source, error = %e, "Rate limit check failed");
            return next.run(request).await;
        }
    };

    if !decision.allowed {
        debug!(
            source = %source,
            path = %request.uri().path(),
            reset_at = decision.reset_at,
            "Rate limit exceeded"
        );
        let mut response = ApiError(AppError::rate_limited(format!(
            "Too many requests; retry after {}",
            decision.reset_at
        )))
        .into_response();
        write_headers(response.headers_mut(), &decision, true);
        return response;
    }

    let mut response = next.run(request).await;
    write_headers(response.headers_mut(), &decision, false);
    response
}

fn write_headers(headers: &mut HeaderMap, decision: &RateLimitDecision, include_reset: bool) {
    headers.insert(HEADER_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(HEADER_REMAINING, HeaderValue::from(decision.remaining));
    if include_reset {
        headers.insert(HEADER_RESET, HeaderValue::from(decision.reset_at));
    }
}
