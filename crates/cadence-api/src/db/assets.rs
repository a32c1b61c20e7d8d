//! Post asset persistence.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cadence_core::{AssetId, AssetType, PostId};

use crate::state::AssetRecord;

pub async fn insert(pool: &PgPool, record: &AssetRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO post_assets (id, post_id, asset_type, filename, original_name,
         file_size, image_prompt, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(record.id.get())
    .bind(record.post_id.get())
    .bind(record.asset_type.as_str())
    .bind(&record.filename)
    .bind(&record.original_name)
    .bind(record.file_size)
    .bind(&record.image_prompt)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn delete(pool: &PgPool, id: AssetId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM post_assets WHERE id = $1")
        .bind(id.get())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<AssetRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AssetRow>(
        "SELECT id, post_id, asset_type, filename, original_name, file_size,
         image_prompt, created_at
         FROM post_assets ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(AssetRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct AssetRow {
    id: i64,
    post_id: i64,
    asset_type: String,
    filename: String,
    original_name: String,
    file_size: i64,
    image_prompt: Option<String>,
    created_at: DateTime<Utc>,
}

impl AssetRow {
    fn into_record(self) -> AssetRecord {
        AssetRecord {
            id: AssetId::new(self.id),
            post_id: PostId::new(self.post_id),
            asset_type: self.asset_type.parse().unwrap_or(AssetType::Other),
            filename: self.filename,
            original_name: self.original_name,
            file_size: self.file_size,
            image_prompt: self.image_prompt,
            created_at: self.created_at,
        }
    }
}
