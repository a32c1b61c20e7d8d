//! # Posts API
//!
//! CRUD over posts plus the two lifecycle actions: publish now and retry.
//! Responses embed the post's assets and its campaign's name and colour.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use cadence_core::error::require_text;
use cadence_core::{classify, CampaignId, PostId, PostStatus, ValidationError};
use cadence_schedule::{assign_slot, available_slots};

use crate::error::{persist_failed, AppError};
use crate::extractors::{extract_validated_json, Validate};
use crate::gate;
use crate::publish::{publish_one, PublishOutcome};
use crate::state::{AppState, AssetRecord, PostRecord};

const TITLE_MAX: usize = 200;
/// LinkedIn commentary limit.
const BODY_MAX: usize = 3000;
const HASHTAGS_MAX: usize = 500;

/// A post with its assets and campaign label.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostView {
    #[serde(flatten)]
    pub post: PostRecord,
    pub campaign_name: Option<String>,
    pub campaign_color: Option<String>,
    pub assets: Vec<AssetRecord>,
}

/// Attach assets and campaign details to a stored post.
pub(crate) fn view(state: &AppState, post: PostRecord) -> PostView {
    let campaign = post.campaign_id.and_then(|id| state.campaigns.get(&id));
    PostView {
        assets: state.assets_for(post.id),
        campaign_name: campaign.as_ref().map(|c| c.name.clone()),
        campaign_color: campaign.map(|c| c.color),
        post,
    }
}

pub(crate) fn find_post(state: &AppState, id: PostId) -> Result<PostRecord, AppError> {
    state.posts.get(&id).ok_or_else(|| AppError::not_found("post", id))
}

fn check_campaign(state: &AppState, id: Option<CampaignId>) -> Result<(), AppError> {
    match id {
        Some(id) if !state.campaigns.contains(&id) => Err(AppError::not_found("campaign", id)),
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    pub campaign_id: Option<i64>,
    /// `scheduled`, `posted` or `failed`.
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub campaign_id: Option<i64>,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub hashtags: String,
    /// Omit to let the allocator choose.
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl Validate for CreatePostRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title, TITLE_MAX)?;
        require_text("body", &self.body, BODY_MAX)?;
        if self.hashtags.chars().count() > HASHTAGS_MAX {
            return Err(ValidationError::TooLong {
                field: "hashtags",
                max: HASHTAGS_MAX,
            });
        }
        Ok(())
    }
}

/// Partial update. Absent fields are left as they are.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub campaign_id: Option<i64>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub hashtags: Option<String>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl Validate for UpdatePostRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            require_text("title", title, TITLE_MAX)?;
        }
        if let Some(body) = &self.body {
            require_text("body", body, BODY_MAX)?;
        }
        if let Some(status) = &self.status {
            status.parse::<PostStatus>()?;
        }
        Ok(())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/posts", get(list_posts).post(create_post))
        .route(
            "/v1/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/v1/posts/:id/publish-now", post(publish_now))
        .route("/v1/posts/:id/retry", post(retry_post))
}

/// GET /v1/posts: List posts, earliest scheduled first.
#[utoipa::path(
    get,
    path = "/v1/posts",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "Posts", body = Vec<PostView>),
        (status = 422, description = "Unknown status filter", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<Vec<PostView>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<PostStatus>)
        .transpose()?;
    let campaign = query.campaign_id.map(CampaignId::new);

    let mut posts = state.posts.filter(|p| {
        campaign.map_or(true, |c| p.campaign_id == Some(c))
            && status.map_or(true, |s| p.status == s)
    });
    posts.sort_by_key(|p| (p.scheduled_at, p.id));

    Ok(Json(posts.into_iter().map(|p| view(&state, p)).collect()))
}

/// GET /v1/posts/:id
#[utoipa::path(
    get,
    path = "/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post found", body = PostView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostView>, AppError> {
    let post = find_post(&state, PostId::new(id))?;
    Ok(Json(view(&state, post)))
}

/// POST /v1/posts: Create a scheduled post.
///
/// Without `scheduled_at` the allocator picks a slot when auto-scheduling
/// is on; otherwise, or when no slot is free, the post goes out in 24 hours.
#[utoipa::path(
    post,
    path = "/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostView),
        (status = 404, description = "Campaign not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error or blocked by compliance", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn create_post(
    State(state): State<AppState>,
    body: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostView>), AppError> {
    let req = extract_validated_json(body)?;
    let campaign_id = req.campaign_id.map(CampaignId::new);
    check_campaign(&state, campaign_id)?;
    gate::check_post(req.title.trim(), &req.body, req.hashtags.trim())?;
    let now = Utc::now();

    let (scheduled_at, auto_scheduled) = match req.scheduled_at {
        Some(at) => (at, false),
        None => {
            let slot = if state.settings.read().auto_schedule {
                let slots = available_slots(&state.occupied_slots(|_| false), now, &state.config.slots);
                assign_slot(classify(&req.body), &slots, &state.config.slots)
            } else {
                None
            };
            match slot {
                Some(at) => (at, true),
                None => (now + Duration::hours(24), false),
            }
        }
    };

    let id = state.posts.next_id();
    let record = PostRecord {
        id,
        campaign_id,
        title: req.title.trim().to_string(),
        body: req.body,
        hashtags: req.hashtags.trim().to_string(),
        scheduled_at,
        status: PostStatus::Scheduled,
        auto_scheduled,
        auto_image: false,
        auto_hashtags: false,
        external_post_id: None,
        posted_at: None,
        error_message: None,
        created_at: now,
    };
    state.posts.insert(id, record.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::posts::upsert(pool, &record)
            .await
            .map_err(|e| persist_failed("post", e))?;
    }

    tracing::info!(post_id = %id, %scheduled_at, auto_scheduled, "post created");
    Ok((StatusCode::CREATED, Json(view(&state, record))))
}

/// PUT /v1/posts/:id: Partially update a post.
#[utoipa::path(
    put,
    path = "/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 422, description = "Validation error or blocked by compliance", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<PostView>, AppError> {
    let req = extract_validated_json(body)?;
    let id = PostId::new(id);
    let campaign_id = req.campaign_id.map(CampaignId::new);
    check_campaign(&state, campaign_id)?;
    let status = req.status.as_deref().map(str::parse::<PostStatus>).transpose()?;

    let mut updated = find_post(&state, id)?;
    if let Some(c) = campaign_id {
        updated.campaign_id = Some(c);
    }
    if let Some(title) = &req.title {
        updated.title = title.trim().to_string();
    }
    if let Some(body) = req.body {
        updated.body = body;
    }
    if let Some(hashtags) = &req.hashtags {
        updated.hashtags = hashtags.trim().to_string();
    }
    if let Some(at) = req.scheduled_at {
        updated.scheduled_at = at;
        updated.auto_scheduled = false;
    }
    if let Some(s) = status {
        updated.status = s;
    }
    // A queued post must stay publishable.
    if updated.status == PostStatus::Scheduled {
        gate::check_post(&updated.title, &updated.body, &updated.hashtags)?;
    }
    state.posts.insert(id, updated.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::posts::upsert(pool, &updated)
            .await
            .map_err(|e| persist_failed("post", e))?;
    }

    Ok(Json(view(&state, updated)))
}

/// DELETE /v1/posts/:id: Delete a post with its assets and findings.
#[utoipa::path(
    delete,
    path = "/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let id = PostId::new(id);
    state
        .posts
        .remove(&id)
        .ok_or_else(|| AppError::not_found("post", id))?;
    let assets = state.assets.remove_where(|a| a.post_id == id);
    state.findings.remove_where(|f| f.post_id == id);
    for asset in &assets {
        super::assets::remove_file(&state, asset).await;
    }

    if let Some(pool) = &state.db_pool {
        crate::db::posts::delete(pool, id)
            .await
            .map_err(|e| persist_failed("post", e))?;
    }

    tracing::info!(post_id = %id, assets = assets.len(), "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/posts/:id/publish-now: Publish immediately.
#[utoipa::path(
    post,
    path = "/v1/posts/{id}/publish-now",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Published", body = PostView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already published", body = crate::error::ErrorBody),
        (status = 422, description = "Blocked by compliance; the post is marked failed", body = crate::error::ErrorBody),
        (status = 502, description = "Publisher rejected the post", body = crate::error::ErrorBody),
        (status = 503, description = "Publisher not connected", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn publish_now(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostView>, AppError> {
    let post = find_post(&state, PostId::new(id))?;
    if post.status == PostStatus::Posted {
        return Err(AppError::Conflict(format!("post {id} is already published")));
    }
    let connected = state.publisher_credentials().is_some();

    match publish_one(&state, &post, Utc::now()).await? {
        PublishOutcome::Posted(stored) => Ok(Json(view(&state, stored))),
        PublishOutcome::Blocked { blocked, .. } => Err(blocked.into()),
        PublishOutcome::Failed(stored) => {
            let message = stored.error_message.unwrap_or_default();
            if connected {
                Err(AppError::Upstream(message))
            } else {
                Err(AppError::ServiceUnavailable(message))
            }
        }
    }
}

/// POST /v1/posts/:id/retry: Put a post back in the queue.
#[utoipa::path(
    post,
    path = "/v1/posts/{id}/retry",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post rescheduled", body = PostView),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
        (status = 409, description = "Already published", body = crate::error::ErrorBody),
        (status = 422, description = "Blocked by compliance", body = crate::error::ErrorBody),
    ),
    tag = "posts"
)]
async fn retry_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostView>, AppError> {
    let id = PostId::new(id);
    let current = find_post(&state, id)?;
    if current.status == PostStatus::Posted {
        return Err(AppError::Conflict(format!("post {id} is already published")));
    }
    gate::check_post(&current.title, &current.body, &current.hashtags)?;
    let updated = state
        .posts
        .update(&id, |p| {
            p.status = PostStatus::Scheduled;
            p.error_message = None;
        })
        .ok_or_else(|| AppError::not_found("post", id))?;

    if let Some(pool) = &state.db_pool {
        crate::db::posts::upsert(pool, &updated)
            .await
            .map_err(|e| persist_failed("post", e))?;
    }

    Ok(Json(view(&state, updated)))
}
