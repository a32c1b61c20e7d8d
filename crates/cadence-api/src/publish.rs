//! # Publishing
//!
//! One publish attempt for one post, shared by the `publish-now` route and
//! the background sweeper. The result is written to the store (and the
//! database when configured) before it is returned.

use chrono::{DateTime, Utc};

use cadence_client::{MediaKind, PublishMedia, PublishRequest};
use cadence_core::{AssetType, PostStatus};

use crate::error::{persist_failed, AppError};
use crate::gate::{check_post, Blocked};
use crate::state::{AppState, PostRecord};

/// Stored on a post when no publisher credentials are configured.
pub const NOT_CONNECTED: &str = "Publisher not connected. Configure credentials in settings.";

/// How an attempt ended. Every variant carries the post as stored afterwards.
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    Posted(PostRecord),
    Failed(PostRecord),
    /// Compliance refused the post; the publisher was never called.
    Blocked { post: PostRecord, blocked: Blocked },
}

impl PublishOutcome {
    pub fn post(&self) -> &PostRecord {
        match self {
            Self::Posted(p) | Self::Failed(p) | Self::Blocked { post: p, .. } => p,
        }
    }
}

/// Image first, then document. Files missing from disk are skipped.
async fn load_media(state: &AppState, post: &PostRecord) -> Option<PublishMedia> {
    let assets = state.assets_for(post.id);
    let chosen = assets
        .iter()
        .find(|a| a.asset_type == AssetType::Image)
        .or_else(|| assets.iter().find(|a| a.asset_type == AssetType::Document))?;
    let kind = match chosen.asset_type {
        AssetType::Image => MediaKind::Image,
        _ => MediaKind::Document,
    };

    let path = state.config.uploads_dir.join(&chosen.filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Some(PublishMedia { kind, bytes }),
        Err(e) => {
            tracing::warn!(
                post_id = %post.id,
                asset_id = %chosen.id,
                path = %path.display(),
                error = %e,
                "asset file unreadable, publishing without media"
            );
            None
        }
    }
}

async fn attempt(state: &AppState, post: &PostRecord) -> Result<String, String> {
    let credentials = state
        .publisher_credentials()
        .ok_or_else(|| NOT_CONNECTED.to_string())?;
    let request = PublishRequest {
        commentary: PublishRequest::commentary_for(&post.body, &post.hashtags),
        title: post.title.clone(),
        media: load_media(state, post).await,
    };
    let publisher = &state.collaborators.publisher;
    publisher
        .publish(&credentials, &request)
        .await
        .map_err(|e| {
            tracing::warn!(
                post_id = %post.id,
                adapter = publisher.adapter_name(),
                error = %e,
                "publish failed"
            );
            e.to_string()
        })
}

/// Publish `post` now and record the result.
///
/// Compliance is checked again first: a post that fails it is marked
/// failed with the blocking rule ids and never reaches the publisher.
///
/// Returns `Err` only when the post vanished mid-attempt or the database
/// write failed; a publisher failure is a [`PublishOutcome::Failed`].
pub async fn publish_one(
    state: &AppState,
    post: &PostRecord,
    now: DateTime<Utc>,
) -> Result<PublishOutcome, AppError> {
    if let Err(blocked) = check_post(&post.title, &post.body, &post.hashtags) {
        return refuse(state, post, blocked).await;
    }

    let result = attempt(state, post).await;
    state.metrics.record_publish(result.is_ok());

    let updated = state
        .posts
        .update(&post.id, |p| match &result {
            Ok(external_id) => {
                p.status = PostStatus::Posted;
                p.external_post_id = Some(external_id.clone());
                p.posted_at = Some(now);
                p.error_message = None;
            }
            Err(message) => {
                p.status = PostStatus::Failed;
                p.error_message = Some(message.clone());
            }
        })
        .ok_or_else(|| AppError::not_found("post", post.id))?;

    if let Some(pool) = &state.db_pool {
        crate::db::posts::upsert(pool, &updated)
            .await
            .map_err(|e| persist_failed("post", e))?;
    }

    match result {
        Ok(external_id) => {
            tracing::info!(post_id = %post.id, external_id = %external_id, "post published");
            Ok(PublishOutcome::Posted(updated))
        }
        Err(_) => Ok(PublishOutcome::Failed(updated)),
    }
}

async fn refuse(
    state: &AppState,
    post: &PostRecord,
    blocked: Blocked,
) -> Result<PublishOutcome, AppError> {
    let message = blocked.summary();
    tracing::warn!(post_id = %post.id, rules = %message, "publish refused by compliance");
    state.metrics.record_compliance(true, false);

    let updated = state
        .posts
        .update(&post.id, |p| {
            p.status = PostStatus::Failed;
            p.error_message = Some(message.clone());
        })
        .ok_or_else(|| AppError::not_found("post", post.id))?;

    if let Some(pool) = &state.db_pool {
        crate::db::posts::upsert(pool, &updated)
            .await
            .map_err(|e| persist_failed("post", e))?;
    }
    Ok(PublishOutcome::Blocked {
        post: updated,
        blocked,
    })
}
