//! # Campaigns API
//!
//! A campaign groups posts that read as one narrative. Deleting a campaign
//! detaches its posts; it never deletes them.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cadence_core::error::require_text;
use cadence_core::{CampaignId, PostStatus, ValidationError};

use crate::error::{persist_failed, AppError};
use crate::extractors::{extract_json, extract_validated_json, Validate};
use crate::state::{AppState, CampaignRecord, DEFAULT_CAMPAIGN_COLOR};

const NAME_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 2000;

/// A campaign with its post counts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignView {
    #[serde(flatten)]
    pub campaign: CampaignRecord,
    pub post_count: usize,
    pub posted_count: usize,
    pub scheduled_count: usize,
    pub failed_count: usize,
}

fn view(state: &AppState, campaign: CampaignRecord) -> CampaignView {
    let posts = state.posts.filter(|p| p.campaign_id == Some(campaign.id));
    let count = |s: PostStatus| posts.iter().filter(|p| p.status == s).count();
    CampaignView {
        post_count: posts.len(),
        posted_count: count(PostStatus::Posted),
        scheduled_count: count(PostStatus::Scheduled),
        failed_count: count(PostStatus::Failed),
        campaign,
    }
}

pub(crate) fn find_campaign(state: &AppState, id: CampaignId) -> Result<CampaignRecord, AppError> {
    state
        .campaigns
        .get(&id)
        .ok_or_else(|| AppError::not_found("campaign", id))
}

/// `#` followed by six hex digits.
fn check_color(color: &str) -> Result<(), AppError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| b.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "color must be a #RRGGBB hex value, got {color:?}"
        )))
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCampaignRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `#31748E`.
    pub color: Option<String>,
}

impl Validate for CreateCampaignRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name, NAME_MAX)?;
        if self.description.chars().count() > DESCRIPTION_MAX {
            return Err(ValidationError::TooLong {
                field: "description",
                max: DESCRIPTION_MAX,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/campaigns", get(list_campaigns).post(create_campaign))
        .route(
            "/v1/campaigns/:id",
            get(get_campaign).put(update_campaign).delete(delete_campaign),
        )
}

/// GET /v1/campaigns: List campaigns, newest first.
#[utoipa::path(
    get,
    path = "/v1/campaigns",
    responses(
        (status = 200, description = "Campaigns with post counts", body = Vec<CampaignView>),
    ),
    tag = "campaigns"
)]
async fn list_campaigns(State(state): State<AppState>) -> Json<Vec<CampaignView>> {
    let mut campaigns = state.campaigns.list();
    campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    Json(campaigns.into_iter().map(|c| view(&state, c)).collect())
}

/// GET /v1/campaigns/:id
#[utoipa::path(
    get,
    path = "/v1/campaigns/{id}",
    params(("id" = i64, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Campaign found", body = CampaignView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "campaigns"
)]
async fn get_campaign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CampaignView>, AppError> {
    let campaign = find_campaign(&state, CampaignId::new(id))?;
    Ok(Json(view(&state, campaign)))
}

/// POST /v1/campaigns: Create a campaign.
#[utoipa::path(
    post,
    path = "/v1/campaigns",
    request_body = CreateCampaignRequest,
    responses(
        (status = 201, description = "Campaign created", body = CampaignView),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "campaigns"
)]
async fn create_campaign(
    State(state): State<AppState>,
    body: Result<Json<CreateCampaignRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CampaignView>), AppError> {
    let req = extract_validated_json(body)?;
    let color = req
        .color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CAMPAIGN_COLOR.to_string());
    check_color(&color)?;

    let id = state.campaigns.next_id();
    let record = CampaignRecord {
        id,
        name: req.name.trim().to_string(),
        description: req.description,
        color,
        created_at: Utc::now(),
    };
    state.campaigns.insert(id, record.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::campaigns::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("campaign", e))?;
    }

    tracing::info!(campaign_id = %id, name = %record.name, "campaign created");
    Ok((StatusCode::CREATED, Json(view(&state, record))))
}

/// PUT /v1/campaigns/:id: Partially update a campaign.
#[utoipa::path(
    put,
    path = "/v1/campaigns/{id}",
    params(("id" = i64, Path, description = "Campaign ID")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Campaign updated", body = CampaignView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error", body = crate::error::ErrorBody),
    ),
    tag = "campaigns"
)]
async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdateCampaignRequest>, JsonRejection>,
) -> Result<Json<CampaignView>, AppError> {
    let req = extract_json(body)?;
    let id = CampaignId::new(id);
    if let Some(name) = &req.name {
        require_text("name", name, NAME_MAX)?;
    }
    if let Some(color) = &req.color {
        check_color(color)?;
    }

    let updated = state
        .campaigns
        .update(&id, |c| {
            if let Some(name) = &req.name {
                c.name = name.trim().to_string();
            }
            if let Some(description) = &req.description {
                c.description = description.clone();
            }
            if let Some(color) = &req.color {
                c.color = color.clone();
            }
        })
        .ok_or_else(|| AppError::not_found("campaign", id))?;

    if let Some(pool) = &state.db_pool {
        crate::db::campaigns::upsert(pool, &updated)
            .await
            .map_err(|e| persist_failed("campaign", e))?;
    }

    Ok(Json(view(&state, updated)))
}

/// DELETE /v1/campaigns/:id: Delete a campaign and detach its posts.
#[utoipa::path(
    delete,
    path = "/v1/campaigns/{id}",
    params(("id" = i64, Path, description = "Campaign ID")),
    responses(
        (status = 204, description = "Campaign deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "campaigns"
)]
async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let id = CampaignId::new(id);
    state
        .campaigns
        .remove(&id)
        .ok_or_else(|| AppError::not_found("campaign", id))?;
    let detached = state
        .posts
        .update_where(|p| p.campaign_id == Some(id), |p| p.campaign_id = None);

    // The foreign key nulls campaign_id on the posts rows.
    if let Some(pool) = &state.db_pool {
        crate::db::campaigns::delete(pool, id)
            .await
            .map_err(|e| persist_failed("campaign", e))?;
    }

    tracing::info!(campaign_id = %id, detached, "campaign deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_must_be_six_hex_digits() {
        assert!(check_color("#31748E").is_ok());
        assert!(check_color("#31748e").is_ok());
        assert!(check_color("31748E").is_err());
        assert!(check_color("#31748").is_err());
        assert!(check_color("#GGGGGG").is_err());
    }

    #[test]
    fn name_is_required() {
        let req = CreateCampaignRequest {
            name: "  ".into(),
            description: String::new(),
            color: None,
        };
        assert_eq!(req.validate(), Err(ValidationError::EmptyField("name")));
    }
}
