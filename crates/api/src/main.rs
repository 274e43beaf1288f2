//! Pinboard API server

use anyhow::Context;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use pinboard_api::{routes::create_router, AppState, Config};
use pinboard_shared::db;

const DB_CONNECT_ATTEMPTS: u32 = 5;
const DB_CONNECT_BACKOFF: std::time::Duration = std::time::Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;

    let pool = connect_with_retry(&config).await?;
    db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let bind_address = config.bind_address.clone();
    let state = AppState::new(pool, config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!(address = %bind_address, "pinboard-api listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Connect to the database, retrying a few times while it comes up.
async fn connect_with_retry(config: &Config) -> anyhow::Result<PgPool> {
    let mut last_err = None;

    for attempt in 1..=DB_CONNECT_ATTEMPTS {
        match db::create_pool(&config.database_url, config.database_max_connections).await {
            Ok(pool) => {
                tracing::info!("connected to database");
                return Ok(pool);
            }
            Err(e) => {
                tracing::warn!(
                    attempt,
                    max_attempts = DB_CONNECT_ATTEMPTS,
                    error = %e,
                    "database connection failed"
                );
                last_err = Some(e);
                if attempt < DB_CONNECT_ATTEMPTS {
                    tokio::time::sleep(DB_CONNECT_BACKOFF).await;
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "could not connect to database after {DB_CONNECT_ATTEMPTS} attempts: {:?}",
        last_err
    ))
}
