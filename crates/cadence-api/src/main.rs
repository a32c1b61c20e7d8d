//! # cadence-api: Binary Entry Point
//!
//! Reads configuration from the environment, connects the optional
//! database, starts the publish sweeper and serves the API.

use anyhow::Context;

use cadence_api::config::{AppConfig, LogFormat};
use cadence_api::state::AppState;
use cadence_client::{ClientConfig, Collaborators};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid server configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let client_config = ClientConfig::from_env().context("invalid collaborator configuration")?;
    let collaborators =
        Collaborators::from_config(&client_config).context("failed to build collaborators")?;
    tracing::info!(?collaborators, "collaborators configured");

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .with_context(|| format!("cannot create uploads dir {}", config.uploads_dir.display()))?;

    let db_pool = cadence_api::db::init_pool(config.database_url.as_deref())
        .await
        .context("database initialization failed")?;

    let port = config.port;
    let sweep_interval = config.sweep_interval;
    let state = AppState::with_config(config, collaborators, db_pool);
    state
        .hydrate_from_db()
        .await
        .context("database hydration failed")?;

    let sweeper = cadence_api::sweeper::spawn_sweeper(state.clone(), sweep_interval);
    let app = cadence_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, sweep_secs = sweep_interval.as_secs(), "Cadence API listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    let served = axum::serve(listener, app).await;
    sweeper.abort();
    served.context("server error")?;

    Ok(())
}
