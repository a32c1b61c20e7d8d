//! Compliance audit trail persistence. Rows are append-only.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use cadence_core::{FindingId, PostId};

use crate::state::FindingRecord;

/// Append findings in one transaction.
pub async fn insert_all(pool: &PgPool, records: &[FindingRecord]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for record in records {
        sqlx::query(
            "INSERT INTO compliance_findings (id, post_id, rule_id, description, auto_fixed, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(record.id.get())
        .bind(record.post_id.get())
        .bind(&record.rule_id)
        .bind(&record.description)
        .bind(record.auto_fixed)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

pub async fn load_all(pool: &PgPool) -> Result<Vec<FindingRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, FindingRow>(
        "SELECT id, post_id, rule_id, description, auto_fixed, created_at
         FROM compliance_findings ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(FindingRow::into_record).collect())
}

#[derive(sqlx::FromRow)]
struct FindingRow {
    id: i64,
    post_id: i64,
    rule_id: String,
    description: String,
    auto_fixed: bool,
    created_at: DateTime<Utc>,
}

impl FindingRow {
    fn into_record(self) -> FindingRecord {
        FindingRecord {
            id: FindingId::new(self.id),
            post_id: PostId::new(self.post_id),
            rule_id: self.rule_id,
            description: self.description,
            auto_fixed: self.auto_fixed,
            created_at: self.created_at,
        }
    }
}
