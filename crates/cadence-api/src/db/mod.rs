//! # Database Persistence Layer
//!
//! The in-memory store is authoritative while the process runs. With a
//! database configured, each API write is repeated here and every table is
//! read back into memory at startup.
//!
//! One submodule per table, each a set of free async functions over
//! `&PgPool`.

pub mod assets;
pub mod campaigns;
pub mod findings;
pub mod posts;
pub mod publisher;
pub mod settings;

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

const MAX_CONNECTIONS: u32 = 20;
const MIN_CONNECTIONS: u32 = 2;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect and apply the embedded migrations.
///
/// `None` selects memory-only mode. A URL that cannot be reached, or a
/// migration that fails, is an error: the service must not start half
/// persisted.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = database_url else {
        tracing::warn!("no DATABASE_URL; records will not survive a restart");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!(max_connections = MAX_CONNECTIONS, "postgres connected, migrations applied");

    Ok(Some(pool))
}

/// Round-trip a trivial query for the readiness probe.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
