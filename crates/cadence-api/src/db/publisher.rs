//! Publisher credential persistence. The table holds at most one row.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::state::PublisherCredentialsRecord;

pub async fn save(pool: &PgPool, record: &PublisherCredentialsRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO publisher_credentials (id, access_token, person_urn, token_expires_at, updated_at)
         VALUES (1, $1, $2, $3, $4)
         ON CONFLICT (id) DO UPDATE SET
         access_token = EXCLUDED.access_token, person_urn = EXCLUDED.person_urn,
         token_expires_at = EXCLUDED.token_expires_at, updated_at = EXCLUDED.updated_at",
    )
    .bind(&record.access_token)
    .bind(&record.person_urn)
    .bind(record.token_expires_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load(pool: &PgPool) -> Result<Option<PublisherCredentialsRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, CredentialsRow>(
        "SELECT access_token, person_urn, token_expires_at, updated_at
         FROM publisher_credentials WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(CredentialsRow::into_record))
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    access_token: String,
    person_urn: String,
    token_expires_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl CredentialsRow {
    fn into_record(self) -> PublisherCredentialsRecord {
        PublisherCredentialsRecord {
            access_token: self.access_token,
            person_urn: self.person_urn,
            token_expires_at: self.token_expires_at,
            updated_at: self.updated_at,
        }
    }
}
