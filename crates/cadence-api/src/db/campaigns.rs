//! Campaign persistence. Deleting a campaign detaches its posts through the
//! `ON DELETE SET NULL` foreign key.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cadence_core::CampaignId;

use crate::state::CampaignRecord;

/// Insert or replace a campaign.
pub async fn upsert(pool: &PgPool, record: &CampaignRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO campaigns (id, name, description, color, created_at)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE
         SET name = EXCLUDED.name, description = EXCLUDED.description, color = EXCLUDED.color",
    )
    .bind(record.id.get())
    .bind(&record.name)
    .bind(&record.description)
    .bind(&record.color)
    .bind(record.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a campaign. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: CampaignId) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
        .bind(id.get())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Load all campaigns on startup.
pub async fn load_all(pool: &PgPool) -> Result<Vec<CampaignRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CampaignRow>(
        "SELECT id, name, description, color, created_at FROM campaigns ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CampaignRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct CampaignRow {
    id: i64,
    name: String,
    description: String,
    color: String,
    created_at: DateTime<Utc>,
}

impl CampaignRow {
    fn into_record(self) -> CampaignRecord {
        CampaignRecord {
            id: CampaignId::new(self.id),
            name: self.name,
            description: self.description,
            color: self.color,
            created_at: self.created_at,
        }
    }
}
