//! # cadence-api: HTTP Service for Cadence
//!
//! Campaign and post management over an in-memory store with optional
//! Postgres write-through, plus the compliance, scheduling and pipeline
//! endpoints and the background publish sweeper.
//!
//! ## API Surface
//!
//! | Prefix                          | Module                   |
//! |---------------------------------|--------------------------|
//! | `/v1/campaigns/*`               | [`routes::campaigns`]    |
//! | `/v1/posts/*`                   | [`routes::posts`]        |
//! | `/v1/posts/:id/assets`, `/v1/assets/*` | [`routes::assets`] |
//! | `/v1/compliance/*`              | [`routes::compliance`]   |
//! | `/v1/posts/:id/suggest-timing`, `/v1/campaigns/:id/auto-schedule`, `/v1/campaigns/:id/audit-narrative` | [`routes::schedule`] |
//! | `/v1/posts/:id/auto-process`, `/v1/campaigns/:id/auto-process-all` | [`routes::pipeline`] |
//! | `/v1/settings`, `/v1/publisher`, `/v1/publisher/test` | [`routes::settings`] |
//! | `/v1/stats`                     | [`routes::stats`]        |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod gate;
pub mod middleware;
pub mod openapi;
pub mod publish;
pub mod routes;
pub mod state;
pub mod sweeper;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
///
/// Health probes, `/metrics` and `/openapi.json` are mounted outside the
/// auth middleware so they stay reachable without credentials.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        token: state.config.auth_token.clone(),
    };
    let metrics = state.metrics.clone();

    // Body size limit: 2 MiB.
    let api = Router::new()
        .merge(routes::campaigns::router())
        .merge(routes::posts::router())
        .merge(routes::assets::router())
        .merge(routes::compliance::router())
        .merge(routes::schedule::router())
        .merge(routes::pipeline::router())
        .merge(routes::settings::router())
        .merge(routes::stats::router())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(Extension(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(auth_config))
        .with_state(state.clone());

    let unauthenticated = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .route("/metrics", axum::routing::get(prometheus_metrics))
        .merge(openapi::router())
        .with_state(state);

    Router::new().merge(unauthenticated).merge(api)
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 503 when a configured database is unreachable.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = db::ping(pool).await {
            tracing::warn!(error = %e, "database health check failed");
            return (StatusCode::SERVICE_UNAVAILABLE, "database unreachable").into_response();
        }
    }

    (StatusCode::OK, "ready").into_response()
}

/// GET /metrics: Prometheus text exposition.
async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable").into_response()
        }
    }
}
