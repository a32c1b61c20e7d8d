//! Automation toggle persistence.

use sqlx::PgPool;

use crate::state::AutomationSettings;

/// Write every toggle.
pub async fn save(pool: &PgPool, settings: &AutomationSettings) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for (key, value) in settings.entries() {
        sqlx::query(
            "INSERT INTO automation_settings (key, value) VALUES ($1, $2)
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}

/// All stored key/value pairs.
pub async fn load_all(pool: &PgPool) -> Result<Vec<(String, bool)>, sqlx::Error> {
    sqlx::query_as::<_, (String, bool)>("SELECT key, value FROM automation_settings")
        .fetch_all(pool)
        .await
}
