//! # Compliance API
//!
//! Read-only access to the compliance engine: free-text checks, checks of
//! a stored post, the rule catalogue, and a post's audit trail.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use utoipa::ToSchema;

use cadence_compliance::{
    catalogue, evaluate, evaluate_post, ComplianceResult, PostComplianceResult, RuleDescriptor,
};
use cadence_core::PostId;

use crate::error::AppError;
use crate::extractors::extract_json;
use crate::routes::posts::find_post;
use crate::state::{AppState, FindingRecord};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckTextRequest {
    /// Empty text passes with no findings.
    #[serde(default)]
    pub text: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/compliance/check", post(check_text))
        .route("/v1/compliance/rules", get(list_rules))
        .route("/v1/posts/:id/compliance", post(check_post))
        .route("/v1/posts/:id/compliance/findings", get(list_findings))
}

/// POST /v1/compliance/check: Evaluate arbitrary text.
#[utoipa::path(
    post,
    path = "/v1/compliance/check",
    request_body = CheckTextRequest,
    responses(
        (status = 200, description = "Evaluation result", body = Object),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
    ),
    tag = "compliance"
)]
async fn check_text(
    body: Result<Json<CheckTextRequest>, JsonRejection>,
) -> Result<Json<ComplianceResult>, AppError> {
    let req = extract_json(body)?;
    Ok(Json(evaluate(&req.text)))
}

/// GET /v1/compliance/rules: The rule catalogue, in evaluation order.
#[utoipa::path(
    get,
    path = "/v1/compliance/rules",
    responses(
        (status = 200, description = "Rules", body = Vec<Object>),
    ),
    tag = "compliance"
)]
async fn list_rules() -> Json<Vec<RuleDescriptor>> {
    Json(catalogue())
}

/// POST /v1/posts/:id/compliance: Evaluate a stored post field by field.
#[utoipa::path(
    post,
    path = "/v1/posts/{id}/compliance",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Evaluation result", body = Object),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "compliance"
)]
async fn check_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostComplianceResult>, AppError> {
    let post = find_post(&state, PostId::new(id))?;
    Ok(Json(evaluate_post(&post.title, &post.body, &post.hashtags)))
}

/// GET /v1/posts/:id/compliance/findings: Audit trail, oldest first.
#[utoipa::path(
    get,
    path = "/v1/posts/{id}/compliance/findings",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Recorded findings", body = Vec<FindingRecord>),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "compliance"
)]
async fn list_findings(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<FindingRecord>>, AppError> {
    let post = find_post(&state, PostId::new(id))?;
    let mut findings = state.findings.filter(|f| f.post_id == post.id);
    findings.sort_by_key(|f| f.id);
    Ok(Json(findings))
}
