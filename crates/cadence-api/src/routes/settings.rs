//! # Settings API
//!
//! Automation toggles and publisher credentials. The access token is
//! write-only: no response ever carries it.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cadence_core::error::require_text;
use cadence_core::ValidationError;

use crate::error::{persist_failed, AppError};
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::{AppState, AutomationSettings, PublisherCredentialsRecord};

/// Partial toggle update. Absent fields are unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub auto_schedule: Option<bool>,
    pub auto_image: Option<bool>,
    pub auto_hashtags: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublisherStatus {
    pub connected: bool,
    pub person_urn: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Result of checking the stored credentials against the publisher.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PublisherCheck {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePublisherRequest {
    pub access_token: String,
    /// Author URN, e.g. `urn:li:person:abc123`.
    pub person_urn: String,
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for UpdatePublisherRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdatePublisherRequest")
            .field("access_token", &"[REDACTED]")
            .field("person_urn", &self.person_urn)
            .field("token_expires_at", &self.token_expires_at)
            .finish()
    }
}

impl Validate for UpdatePublisherRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("access_token", &self.access_token, 4096)?;
        require_text("person_urn", &self.person_urn, 255)
    }
}

fn status_of(record: Option<&PublisherCredentialsRecord>) -> PublisherStatus {
    PublisherStatus {
        connected: record.is_some(),
        person_urn: record.map(|r| r.person_urn.clone()),
        token_expires_at: record.and_then(|r| r.token_expires_at),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/settings", get(get_settings).put(update_settings))
        .route("/v1/publisher", get(get_publisher).put(update_publisher))
        .route("/v1/publisher/test", get(test_publisher))
}

/// GET /v1/settings
#[utoipa::path(
    get,
    path = "/v1/settings",
    responses((status = 200, description = "Automation toggles", body = AutomationSettings)),
    tag = "settings"
)]
async fn get_settings(State(state): State<AppState>) -> Json<AutomationSettings> {
    Json(*state.settings.read())
}

/// PUT /v1/settings
#[utoipa::path(
    put,
    path = "/v1/settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated toggles", body = AutomationSettings),
        (status = 400, description = "Malformed body", body = crate::error::ErrorBody),
    ),
    tag = "settings"
)]
async fn update_settings(
    State(state): State<AppState>,
    body: Result<Json<UpdateSettingsRequest>, JsonRejection>,
) -> Result<Json<AutomationSettings>, AppError> {
    let req = extract_json(body)?;
    let updated = {
        let mut settings = state.settings.write();
        if let Some(v) = req.auto_schedule {
            settings.auto_schedule = v;
        }
        if let Some(v) = req.auto_image {
            settings.auto_image = v;
        }
        if let Some(v) = req.auto_hashtags {
            settings.auto_hashtags = v;
        }
        *settings
    };

    if let Some(pool) = &state.db_pool {
        crate::db::settings::save(pool, &updated)
            .await
            .map_err(|e| persist_failed("automation settings", e))?;
    }

    tracing::info!(?updated, "automation settings changed");
    Ok(Json(updated))
}

/// GET /v1/publisher: Connection status. Never includes the token.
#[utoipa::path(
    get,
    path = "/v1/publisher",
    responses((status = 200, description = "Publisher status", body = PublisherStatus)),
    tag = "settings"
)]
async fn get_publisher(State(state): State<AppState>) -> Json<PublisherStatus> {
    Json(status_of(state.publisher.read().as_ref()))
}

/// PUT /v1/publisher: Store publisher credentials.
#[utoipa::path(
    put,
    path = "/v1/publisher",
    request_body = UpdatePublisherRequest,
    responses(
        (status = 200, description = "Publisher status", body = PublisherStatus),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "settings"
)]
async fn update_publisher(
    State(state): State<AppState>,
    body: Result<Json<UpdatePublisherRequest>, JsonRejection>,
) -> Result<Json<PublisherStatus>, AppError> {
    let req = extract_validated_json(body)?;
    let record = PublisherCredentialsRecord {
        access_token: req.access_token.trim().to_string(),
        person_urn: req.person_urn.trim().to_string(),
        token_expires_at: req.token_expires_at,
        updated_at: Utc::now(),
    };
    *state.publisher.write() = Some(record.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::publisher::save(pool, &record)
            .await
            .map_err(|e| persist_failed("publisher credentials", e))?;
    }

    tracing::info!(person_urn = %record.person_urn, "publisher credentials updated");
    Ok(Json(status_of(Some(&record))))
}

/// GET /v1/publisher/test: Check the stored credentials without posting.
///
/// Always 200; a missing or rejected token is reported in the body.
#[utoipa::path(
    get,
    path = "/v1/publisher/test",
    responses((status = 200, description = "Credential check", body = PublisherCheck)),
    tag = "settings"
)]
async fn test_publisher(State(state): State<AppState>) -> Json<PublisherCheck> {
    let Some(credentials) = state.publisher_credentials() else {
        return Json(PublisherCheck {
            error: Some("No access token configured".to_string()),
            ..PublisherCheck::default()
        });
    };
    let publisher = &state.collaborators.publisher;
    match publisher.verify(&credentials).await {
        Ok(profile) => Json(PublisherCheck {
            connected: true,
            name: profile.name,
            sub: profile.subject,
            picture: profile.picture,
            error: None,
        }),
        Err(e) => {
            tracing::warn!(adapter = publisher.adapter_name(), error = %e, "publisher credential check failed");
            Json(PublisherCheck {
                error: Some(e.to_string()),
                ..PublisherCheck::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_debug_hides_token() {
        let req = UpdatePublisherRequest {
            access_token: "AQX-secret".into(),
            person_urn: "urn:li:person:1".into(),
            token_expires_at: None,
        };
        assert!(!format!("{req:?}").contains("AQX"));
    }

    #[test]
    fn status_without_credentials() {
        let s = status_of(None);
        assert!(!s.connected);
        assert!(s.person_urn.is_none());
    }
}
