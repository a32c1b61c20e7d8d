//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Every error renders as `{"error": {"code", "message", "details"}}`.
//! Internal and upstream causes are logged and replaced with a generic
//! message before they reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "COMPLIANCE_REJECTED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Structured context, present only on compliance rejections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or wrong bearer token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A field failed domain validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed body or an operation whose precondition does not hold (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict with current resource state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The content itself was refused, e.g. by the compliance gate (422).
    /// `details` is returned to the client.
    #[error("{message}")]
    UnprocessableEntity {
        message: String,
        details: serde_json::Value,
    },

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),

    /// A collaborator (publisher, renderer) failed (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Service dependency not configured (503).
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::UnprocessableEntity { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "COMPLIANCE_REJECTED")
            }
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} {id} not found"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream(_) => "An upstream service error occurred".to_string(),
            Self::UnprocessableEntity { message, .. } => message.clone(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::error!(error = %self, "upstream collaborator error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let details = match self {
            Self::UnprocessableEntity { details, .. } => Some(details),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<cadence_core::ValidationError> for AppError {
    fn from(err: cadence_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Log a failed write-through and turn it into a 500.
pub(crate) fn persist_failed(what: &'static str, err: sqlx::Error) -> AppError {
    tracing::error!(record = what, error = %err, "failed to persist to database");
    AppError::Internal(format!("{what} updated in memory but database persist failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_codes() {
        let cases = [
            (AppError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AppError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            (AppError::Conflict("x".into()), StatusCode::CONFLICT, "CONFLICT"),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            (AppError::Upstream("x".into()), StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            (
                AppError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_and_code(), (status, code), "{err}");
        }
    }

    #[tokio::test]
    async fn internal_message_is_not_leaked() {
        let (status, body) = body_json(AppError::Internal("pool exhausted at db-3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn upstream_message_is_not_leaked() {
        let (_, body) = body_json(AppError::Upstream("token abc expired".into())).await;
        assert!(!body["error"]["message"].as_str().unwrap().contains("abc"));
    }

    #[tokio::test]
    async fn rejection_carries_details() {
        let err = AppError::UnprocessableEntity {
            message: "refused".into(),
            details: serde_json::json!({ "violations": ["sec-relationship"] }),
        };
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "COMPLIANCE_REJECTED");
        assert_eq!(body["error"]["message"], "refused");
        assert_eq!(body["error"]["details"]["violations"][0], "sec-relationship");
    }

    #[test]
    fn validation_error_converts() {
        let err: AppError = cadence_core::ValidationError::EmptyField("title").into();
        assert!(matches!(err, AppError::Validation(ref m) if m == "title must not be empty"));
    }
}
