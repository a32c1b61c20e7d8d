//! # Scheduling API
//!
//! Slot suggestions for one post, narrative scheduling for a campaign, and
//! a read-only audit of a campaign's order. Occupancy is always the set of
//! other scheduled posts.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cadence_core::{classify, CampaignId, ContentType, PostId, PostStatus};
use cadence_pipeline::{audit_narrative, schedule_campaign, NarrativeAudit};
use cadence_schedule::{assign_slot, available_slots, Assignment, NarrativeItem};

use crate::error::{persist_failed, AppError};
use crate::gate;
use crate::routes::campaigns::find_campaign;
use crate::routes::posts::find_post;
use crate::state::AppState;

/// Free slots offered beside the recommendation.
const ALTERNATIVES: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimingSuggestion {
    #[schema(value_type = String)]
    pub content_type: ContentType,
    /// `None` when no slot is free inside the horizon.
    pub recommended: Option<DateTime<Utc>>,
    pub alternatives: Vec<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AutoScheduleResponse {
    #[schema(value_type = Vec<Object>)]
    pub assignments: Vec<Assignment>,
    /// Posts that received a slot.
    pub count: usize,
}

/// Recommendation plus the next free slots that are not it.
fn suggest(
    content_type: ContentType,
    slots: &[DateTime<Utc>],
    config: &cadence_schedule::SlotConfig,
) -> TimingSuggestion {
    let recommended = assign_slot(content_type, slots, config);
    let alternatives = slots
        .iter()
        .copied()
        .filter(|s| Some(*s) != recommended)
        .take(ALTERNATIVES)
        .collect();
    TimingSuggestion {
        content_type,
        recommended,
        alternatives,
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/posts/:id/suggest-timing", get(suggest_timing))
        .route("/v1/campaigns/:id/auto-schedule", post(auto_schedule))
        .route("/v1/campaigns/:id/audit-narrative", post(audit_campaign_narrative))
}

/// GET /v1/posts/:id/suggest-timing
#[utoipa::path(
    get,
    path = "/v1/posts/{id}/suggest-timing",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Suggested slots", body = TimingSuggestion),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "schedule"
)]
async fn suggest_timing(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TimingSuggestion>, AppError> {
    let post = find_post(&state, PostId::new(id))?;
    let occupied = state.occupied_slots(|p| p.id == post.id);
    let slots = available_slots(&occupied, Utc::now(), &state.config.slots);
    Ok(Json(suggest(classify(&post.body), &slots, &state.config.slots)))
}

/// POST /v1/campaigns/:id/auto-schedule: Reschedule a campaign as a narrative.
///
/// Only the campaign's scheduled posts move. Other campaigns' scheduled
/// posts count as occupied.
#[utoipa::path(
    post,
    path = "/v1/campaigns/{id}/auto-schedule",
    params(("id" = i64, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Assignments", body = AutoScheduleResponse),
        (status = 400, description = "No scheduled posts in the campaign", body = crate::error::ErrorBody),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorBody),
        (status = 422, description = "A post in the campaign is blocked by compliance", body = crate::error::ErrorBody),
    ),
    tag = "schedule"
)]
async fn auto_schedule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AutoScheduleResponse>, AppError> {
    let campaign = find_campaign(&state, CampaignId::new(id))?;
    let mut posts = state
        .posts
        .filter(|p| p.campaign_id == Some(campaign.id) && p.status == PostStatus::Scheduled);
    if posts.is_empty() {
        return Err(AppError::BadRequest(
            "No scheduled posts in this campaign".to_string(),
        ));
    }
    posts.sort_by_key(|p| (p.scheduled_at, p.id));
    gate::check_batch(&posts)?;

    let items: Vec<NarrativeItem> = posts
        .iter()
        .map(|p| NarrativeItem {
            id: p.id,
            title: p.title.clone(),
            content_type: classify(&p.body),
        })
        .collect();
    let occupied = state.occupied_slots(|p| p.campaign_id == Some(campaign.id));
    let assignments = schedule_campaign(
        &items,
        &occupied,
        &state.collaborators,
        &state.config.slots,
        Utc::now(),
    )
    .await;

    let mut count = 0;
    for assignment in &assignments {
        let Some(slot) = assignment.slot else {
            tracing::warn!(post_id = %assignment.post_id, "no slot left for campaign post");
            continue;
        };
        let Some(updated) = state.posts.update(&assignment.post_id, |p| {
            p.scheduled_at = slot;
            p.auto_scheduled = true;
        }) else {
            continue;
        };
        count += 1;
        if let Some(pool) = &state.db_pool {
            crate::db::posts::upsert(pool, &updated)
                .await
                .map_err(|e| persist_failed("post", e))?;
        }
    }

    tracing::info!(campaign_id = %campaign.id, posts = items.len(), scheduled = count, "campaign auto-scheduled");
    Ok(Json(AutoScheduleResponse { assignments, count }))
}

/// POST /v1/campaigns/:id/audit-narrative: Compare the campaign's order
/// with the narrative collaborator's recommendation.
///
/// Failed posts are left out. Nothing is rescheduled.
#[utoipa::path(
    post,
    path = "/v1/campaigns/{id}/audit-narrative",
    params(("id" = i64, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Audit verdict and notes", body = Object),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorBody),
    ),
    tag = "schedule"
)]
async fn audit_campaign_narrative(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NarrativeAudit>, AppError> {
    let campaign = find_campaign(&state, CampaignId::new(id))?;
    let mut posts = state
        .posts
        .filter(|p| p.campaign_id == Some(campaign.id) && p.status != PostStatus::Failed);
    posts.sort_by_key(|p| (p.scheduled_at, p.id));

    let items: Vec<NarrativeItem> = posts
        .iter()
        .map(|p| NarrativeItem {
            id: p.id,
            title: p.title.clone(),
            content_type: classify(&p.body),
        })
        .collect();
    let audit = audit_narrative(&items, &state.collaborators).await;
    tracing::info!(campaign_id = %campaign.id, posts = items.len(), verdict = ?audit.verdict, "campaign narrative audited");
    Ok(Json(audit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_schedule::SlotConfig;

    #[test]
    fn alternatives_exclude_the_recommendation() {
        let cfg = SlotConfig::default();
        let now = DateTime::parse_from_rfc3339("2026-10-16T15:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let slots = available_slots(&[], now, &cfg);
        let s = suggest(ContentType::Vision, &slots, &cfg);
        let rec = s.recommended.unwrap();
        assert_eq!(s.alternatives.len(), ALTERNATIVES);
        assert!(!s.alternatives.contains(&rec));
        assert_eq!(cfg.local_weekday(rec), chrono::Weekday::Fri);
    }

    #[test]
    fn no_slots_means_no_recommendation() {
        let s = suggest(ContentType::General, &[], &SlotConfig::default());
        assert!(s.recommended.is_none());
        assert!(s.alternatives.is_empty());
    }
}
