//! # Assets API
//!
//! Assets are files already sitting in the uploads directory; registering
//! one records it against a post. The kind is inferred from the extension.

use std::path::Path as FsPath;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;

use cadence_core::error::require_text;
use cadence_core::{AssetId, AssetType, PostId, ValidationError};

use crate::error::{persist_failed, AppError};
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::posts::find_post;
use crate::state::{AppState, AssetRecord};

const FILENAME_MAX: usize = 255;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterAssetRequest {
    /// Bare file name inside the uploads directory.
    pub filename: String,
    /// Name shown to users. Defaults to `filename`.
    pub original_name: Option<String>,
}

/// A bare name: no separators, no leading dot.
fn is_bare_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && !name.starts_with('.') && name != ".."
}

impl Validate for RegisterAssetRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("filename", &self.filename, FILENAME_MAX)
    }
}

/// Delete an asset's file. A file that is already gone is fine.
pub(crate) async fn remove_file(state: &AppState, asset: &AssetRecord) {
    let path = state.config.uploads_dir.join(&asset.filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "asset file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(asset_id = %asset.id, path = %path.display(), error = %e, "failed to remove asset file")
        }
    }
}

async fn file_size(dir: &FsPath, filename: &str) -> Result<u64, AppError> {
    match tokio::fs::metadata(dir.join(filename)).await {
        Ok(meta) if meta.is_file() => Ok(meta.len()),
        Ok(_) => Err(AppError::BadRequest(format!("{filename} is not a regular file"))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::BadRequest(
            format!("{filename} not found in uploads directory"),
        )),
        Err(e) => Err(AppError::Internal(format!("stat {filename}: {e}"))),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/posts/:id/assets", post(register_asset))
        .route("/v1/assets/:id", delete(delete_asset))
}

/// POST /v1/posts/:id/assets: Attach an uploaded file to a post.
#[utoipa::path(
    post,
    path = "/v1/posts/{id}/assets",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = RegisterAssetRequest,
    responses(
        (status = 201, description = "Asset registered", body = AssetRecord),
        (status = 400, description = "File missing or name not allowed", body = crate::error::ErrorBody),
        (status = 404, description = "Post not found", body = crate::error::ErrorBody),
    ),
    tag = "assets"
)]
async fn register_asset(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    body: Result<Json<RegisterAssetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssetRecord>), AppError> {
    let req = extract_validated_json(body)?;
    let post = find_post(&state, PostId::new(post_id))?;
    let filename = req.filename.trim().to_string();
    if !is_bare_name(&filename) {
        return Err(AppError::BadRequest(format!(
            "{filename:?} must be a bare file name"
        )));
    }
    let size = file_size(&state.config.uploads_dir, &filename).await?;

    let id: AssetId = state.assets.next_id();
    let record = AssetRecord {
        id,
        post_id: post.id,
        asset_type: AssetType::from_filename(&filename),
        original_name: req
            .original_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| filename.clone()),
        filename,
        file_size: i64::try_from(size).unwrap_or(i64::MAX),
        image_prompt: None,
        created_at: Utc::now(),
    };
    state.assets.insert(id, record.clone());

    if let Some(pool) = &state.db_pool {
        crate::db::assets::insert(pool, &record)
            .await
            .map_err(|e| persist_failed("asset", e))?;
    }

    tracing::info!(asset_id = %id, post_id = %post.id, kind = record.asset_type.as_str(), "asset registered");
    Ok((StatusCode::CREATED, Json(record)))
}

/// DELETE /v1/assets/:id: Remove an asset record and its file.
#[utoipa::path(
    delete,
    path = "/v1/assets/{id}",
    params(("id" = i64, Path, description = "Asset ID")),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 404, description = "Not found", body = crate::error::ErrorBody),
    ),
    tag = "assets"
)]
async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let id = AssetId::new(id);
    let asset = state
        .assets
        .remove(&id)
        .ok_or_else(|| AppError::not_found("asset", id))?;
    remove_file(&state, &asset).await;

    if let Some(pool) = &state.db_pool {
        crate::db::assets::delete(pool, id)
            .await
            .map_err(|e| persist_failed("asset", e))?;
    }

    Ok(StatusCode::NO_CONTENT)
}
