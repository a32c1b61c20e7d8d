//! Post persistence. Assets and findings cascade on delete.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cadence_core::{CampaignId, PostId, PostStatus};

use crate::state::PostRecord;

/// Insert or replace a post with all of its columns.
pub async fn upsert(pool: &PgPool, record: &PostRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO posts (id, campaign_id, title, body, hashtags, scheduled_at, status,
         auto_scheduled, auto_image, auto_hashtags, external_post_id, posted_at,
         error_message, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
         ON CONFLICT (id) DO UPDATE SET
         campaign_id = EXCLUDED.campaign_id, title = EXCLUDED.title, body = EXCLUDED.body,
         hashtags = EXCLUDED.hashtags, scheduled_at = EXCLUDED.scheduled_at,
         status = EXCLUDED.status, auto_scheduled = EXCLUDED.auto_scheduled,
         auto_image = EXCLUDED.auto_image, auto_hashtags = EXCLUDED.auto_hashtags,
         external_post_id = EXCLUDED.external_post_id, posted_at = EXCLUDED.posted_at,
         error_message = EXCLUDED.error_message",
    )
    .bind(record.id.get())
    .bind(record.campaign_id.map(CampaignId::get))
    .bind(&record.title)
    .bind(&record.body)
    .bind(&record.hashtags)
    .bind(record.scheduled_at)
    .bind(record.status.as_str())
    .bind(record.auto_scheduled)
    .bind(record.auto_image)
    .bind(record.auto_hashtags)
    .bind(&record.external_post_id)
    .bind(record.posted_at)
    .bind(&record.error_message)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a post. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: PostId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id.get())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all posts on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<PostRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PostRow>(
        "SELECT id, campaign_id, title, body, hashtags, scheduled_at, status,
         auto_scheduled, auto_image, auto_hashtags, external_post_id, posted_at,
         error_message, created_at
         FROM posts ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PostRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    campaign_id: Option<i64>,
    title: String,
    body: String,
    hashtags: String,
    scheduled_at: DateTime<Utc>,
    status: String,
    auto_scheduled: bool,
    auto_image: bool,
    auto_hashtags: bool,
    external_post_id: Option<String>,
    posted_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl PostRow {
    fn into_record(self) -> PostRecord {
        let status = self.status.parse().unwrap_or_else(|_| {
            tracing::warn!(post_id = self.id, status = %self.status, "unknown stored status, treating as failed");
            PostStatus::Failed
        });
        PostRecord {
            id: PostId::new(self.id),
            campaign_id: self.campaign_id.map(CampaignId::new),
            title: self.title,
            body: self.body,
            hashtags: self.hashtags,
            scheduled_at: self.scheduled_at,
            status,
            auto_scheduled: self.auto_scheduled,
            auto_image: self.auto_image,
            auto_hashtags: self.auto_hashtags,
            external_post_id: self.external_post_id,
            posted_at: self.posted_at,
            error_message: self.error_message,
            created_at: self.created_at,
        }
    }
}
