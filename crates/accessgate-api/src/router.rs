//! Route definitions for the AccessGate HTTP API.
//!
//! All routes are mounted under `/api`. Accounting and control-admin routes
//! carry their own rate-limit middleware.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let server = &state.config.server;

    let api_routes = Router::new()
        .merge(accounting_routes(&state))
        .merge(control_routes(&state))
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(server.body_limit_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_seconds,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors::build_cors_layer(&server.cors))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// NAS accounting ingress
fn accounting_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/radius/accounting",
            post(handlers::accounting::ingest),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::accounting_rate_limit,
        ))
}

/// Control-admin routes, sharing the stricter limit
fn control_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/radius/control", post(handlers::control::control))
        .route(
            "/radius/control/requests",
            get(handlers::control::list_requests),
        )
        .route(
            "/radius/control/requests/{id}/requeue",
            post(handlers::control::requeue),
        )
        .route("/radius/sessions", post(handlers::sessions::register))
        .route(
            "/radius/sessions/{session_id}",
            get(handlers::sessions::get_session),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::control_rate_limit,
        ))
}
