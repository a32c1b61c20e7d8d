//! # Pipeline API
//!
//! Runs stored posts through compliance, tagging, imaging and scheduling,
//! then writes the results back: fixed text, tags, a generated image asset,
//! the new slot, and the compliance findings for the audit trail.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{DateTime, Utc};

use cadence_compliance::{rule, Finding};
use cadence_core::{AssetType, CampaignId, PostId, PostStatus};
use cadence_pipeline::{
    process_campaign, process_post, CampaignSummary, PostInput, ProcessOutcome, ProcessedPost,
    Rejection,
};

use crate::error::{persist_failed, AppError};
use crate::routes::campaigns::find_campaign;
use crate::routes::posts::find_post;
use crate::state::{AppState, AssetRecord, FindingRecord, PostRecord};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/posts/:id/auto-process", post(auto_process))
        .route("/v1/campaigns/:id/auto-process-all", post(auto_process_all))
}

fn input_for(state: &AppState, post: &PostRecord) -> PostInput {
    PostInput {
        id: post.id,
        title: post.title.clone(),
        body: post.body.clone(),
        hashtags: post.hashtags.clone(),
        has_image: state
            .assets_for(post.id)
            .iter()
            .any(|a| a.asset_type == AssetType::Image),
    }
}

fn finding(
    state: &AppState,
    post_id: PostId,
    rule_id: &str,
    description: &str,
    auto_fixed: bool,
    now: DateTime<Utc>,
) -> FindingRecord {
    FindingRecord {
        id: state.findings.next_id(),
        post_id,
        rule_id: rule_id.to_string(),
        description: description.to_string(),
        auto_fixed,
        created_at: now,
    }
}

fn from_findings<'a>(
    state: &AppState,
    post_id: PostId,
    findings: impl IntoIterator<Item = &'a Finding>,
    auto_fixed: bool,
    now: DateTime<Utc>,
) -> Vec<FindingRecord> {
    findings
        .into_iter()
        .map(|f| finding(state, post_id, f.rule_id, f.description, auto_fixed, now))
        .collect()
}

/// Audit rows for a rejection: the unfixable findings, then residual rules.
fn rejection_findings(
    state: &AppState,
    rejection: &Rejection,
    now: DateTime<Utc>,
) -> Vec<FindingRecord> {
    let mut rows = from_findings(state, rejection.post_id, &rejection.violations, false, now);
    for id in &rejection.residual {
        let description = rule(id).map_or("", |r| r.description);
        rows.push(finding(state, rejection.post_id, id, description, false, now));
    }
    rows
}

async fn store_findings(state: &AppState, rows: Vec<FindingRecord>) -> Result<(), AppError> {
    if rows.is_empty() {
        return Ok(());
    }
    for row in &rows {
        state.findings.insert(row.id, row.clone());
    }
    if let Some(pool) = &state.db_pool {
        crate::db::findings::insert_all(pool, &rows)
            .await
            .map_err(|e| persist_failed("compliance finding", e))?;
    }
    Ok(())
}

/// Write an accepted post's results to the store.
async fn apply_accepted(
    state: &AppState,
    processed: &ProcessedPost,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let asset = processed.image.as_ref().map(|image| AssetRecord {
        id: state.assets.next_id(),
        post_id: processed.post_id,
        asset_type: AssetType::Image,
        filename: image.filename.clone(),
        original_name: image.original_name.clone(),
        file_size: i64::try_from(image.file_size).unwrap_or(i64::MAX),
        image_prompt: Some(image.prompt.clone()),
        created_at: now,
    });

    let updated = state
        .posts
        .update(&processed.post_id, |p| {
            p.title = processed.fixed.title.clone();
            p.body = processed.fixed.body.clone();
            if p.hashtags.trim().is_empty() && !processed.tags.is_empty() {
                p.auto_hashtags = true;
            }
            p.hashtags = processed.tags.clone();
            if let Some(slot) = processed.scheduled_at {
                p.scheduled_at = slot;
                p.auto_scheduled = true;
            }
            if asset.is_some() {
                p.auto_image = true;
            }
        })
        .ok_or_else(|| AppError::not_found("post", processed.post_id))?;

    if let Some(asset) = &asset {
        state.assets.insert(asset.id, asset.clone());
    }

    if let Some(pool) = &state.db_pool {
        crate::db::posts::upsert(pool, &updated)
            .await
            .map_err(|e| persist_failed("post", e))?;
        if let Some(asset) = &asset {
            crate::db::assets::insert(pool, asset)
                .await
                .map_err(|e| persist_failed("asset", e))?;
        }
    }

    let fixed = processed.violations.iter().filter(|f| f.auto_fixable);
    store_findings(state, from_findings(state, processed.post_id, fixed, true, now)).await
}

/// Take a rejected post out of the publish queue and record why.
async fn apply_rejected(
    state: &AppState,
    rejection: &Rejection,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let rule_ids: Vec<&str> = rejection
        .violations
        .iter()
        .map(|f| f.rule_id)
        .chain(rejection.residual.iter().copied())
        .collect();
    let message = format!("Blocked by compliance rules: {}", rule_ids.join(", "));

    let updated = state.posts.update(&rejection.post_id, |p| {
        if p.status == PostStatus::Scheduled {
            p.status = PostStatus::Failed;
            p.error_message = Some(message.clone());
        }
    });
    if let (Some(pool), Some(updated)) = (&state.db_pool, &updated) {
        crate::db::posts::upsert(pool, updated)
            .await
            .map_err(|e| persist_failed("post", e))?;
    }
    store_findings(state, rejection_findings(state, rejection, now)).await
}

/// Persist one outcome and count it.
async fn apply_outcome(
    state: &AppState,
    outcome: &ProcessOutcome,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    match outcome {
        ProcessOutcome::Accepted(processed) => {
            state.metrics.record_compliance(false, processed.auto_fixed);
            apply_accepted(state, processed, now).await
        }
        ProcessOutcome::Rejected(rejection) => {
            state.metrics.record_compliance(true, false);
            apply_rejected(state, rejection, now).await
        }
    }
}

/// POST /v1/posts/:id/auto-process: Run one post through the pipeline.
#[utoipa::path(
    post,
    path = "/v1/posts/{id}/auto-process",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post accepted and updated", body = Object),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Rejected by the compliance gate", body = crate::error::ErrorBody),
    ),
    tag = "pipeline"
)]
async fn auto_process(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProcessedPost>, AppError> {
    let post = find_post(&state, PostId::new(id))?;
    let now = Utc::now();
    let occupied = state.occupied_slots(|p| p.id == post.id);
    let options = state.pipeline_options(now);

    let input = input_for(&state, &post);
    let outcome = process_post(&input, &occupied, &state.collaborators, &options).await;
    apply_outcome(&state, &outcome, now).await?;

    match outcome {
        ProcessOutcome::Accepted(processed) => Ok(Json(processed)),
        ProcessOutcome::Rejected(rejection) => {
            let details = serde_json::to_value(&rejection)
                .map_err(|e| AppError::Internal(format!("serialize rejection: {e}")))?;
            Err(AppError::UnprocessableEntity {
                message: rejection.reason,
                details,
            })
        }
    }
}

/// POST /v1/campaigns/:id/auto-process-all: Run every post in a campaign.
///
/// Posts are processed in schedule order; each accepted slot is taken
/// before the next post is scheduled.
#[utoipa::path(
    post,
    path = "/v1/campaigns/{id}/auto-process-all",
    params(("id" = i64, Path, description = "Campaign ID")),
    responses(
        (status = 200, description = "Summary of the run", body = Object),
        (status = 400, description = "Campaign has no posts", body = crate::error::ErrorBody),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorBody),
    ),
    tag = "pipeline"
)]
async fn auto_process_all(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CampaignSummary>, AppError> {
    let campaign = find_campaign(&state, CampaignId::new(id))?;
    let mut posts = state.posts.filter(|p| p.campaign_id == Some(campaign.id));
    if posts.is_empty() {
        return Err(AppError::BadRequest("No posts in this campaign".to_string()));
    }
    posts.sort_by_key(|p| (p.scheduled_at, p.id));

    let now = Utc::now();
    let inputs: Vec<PostInput> = posts.iter().map(|p| input_for(&state, p)).collect();
    let occupied = state.occupied_slots(|p| p.campaign_id == Some(campaign.id));
    let options = state.pipeline_options(now);

    let summary = process_campaign(&inputs, &occupied, &state.collaborators, &options).await;
    for outcome in &summary.results {
        apply_outcome(&state, outcome, now).await?;
    }

    tracing::info!(
        campaign_id = %campaign.id,
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        imaged = summary.imaged,
        "campaign processed"
    );
    Ok(Json(summary))
}
