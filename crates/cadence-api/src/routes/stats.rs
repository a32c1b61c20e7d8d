//! # Dashboard Stats

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cadence_core::PostStatus;

use crate::routes::posts::{view, PostView};
use crate::state::AppState;

/// Posts shown in each dashboard list.
const LIST_LEN: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PostCounts {
    pub total: usize,
    pub scheduled: usize,
    pub posted: usize,
    pub failed: usize,
    pub auto_images: usize,
    pub auto_hashtags: usize,
    pub auto_scheduled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub stats: PostCounts,
    /// Next scheduled posts, soonest first.
    pub upcoming: Vec<PostView>,
    /// Latest posted or failed posts, newest first.
    pub recent: Vec<PostView>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/stats", get(stats))
}

/// GET /v1/stats
#[utoipa::path(
    get,
    path = "/v1/stats",
    responses((status = 200, description = "Dashboard counters", body = StatsResponse)),
    tag = "stats"
)]
async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let posts = state.posts.list();
    let status = |s: PostStatus| posts.iter().filter(|p| p.status == s).count();
    let counts = PostCounts {
        total: posts.len(),
        scheduled: status(PostStatus::Scheduled),
        posted: status(PostStatus::Posted),
        failed: status(PostStatus::Failed),
        auto_images: posts.iter().filter(|p| p.auto_image).count(),
        auto_hashtags: posts.iter().filter(|p| p.auto_hashtags).count(),
        auto_scheduled: posts.iter().filter(|p| p.auto_scheduled).count(),
    };

    let mut upcoming: Vec<_> = posts
        .iter()
        .filter(|p| p.status == PostStatus::Scheduled)
        .cloned()
        .collect();
    upcoming.sort_by_key(|p| (p.scheduled_at, p.id));

    let mut recent: Vec<_> = posts
        .iter()
        .filter(|p| p.status != PostStatus::Scheduled)
        .cloned()
        .collect();
    recent.sort_by(|a, b| {
        b.posted_at
            .unwrap_or(b.created_at)
            .cmp(&a.posted_at.unwrap_or(a.created_at))
            .then(b.id.cmp(&a.id))
    });

    Json(StatsResponse {
        stats: counts,
        upcoming: upcoming.into_iter().take(LIST_LEN).map(|p| view(&state, p)).collect(),
        recent: recent.into_iter().take(LIST_LEN).map(|p| view(&state, p)).collect(),
    })
}
